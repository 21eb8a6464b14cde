//! Greeter Hub
//!
//! Main entry point for the greeter-hub service.

use greeter_hub::{
    booking_client::BookingClient,
    camera_directory::CameraDirectory,
    entry_workflow::{EntryWorkflow, WorkflowQueue},
    event_ingress::EventIngress,
    identity_client::IdentityClient,
    meraki_client::MerakiClient,
    notification_dispatcher::Dispatcher,
    occupancy_store::OccupancyStore,
    state::{AppConfig, AppState},
    web_api,
    zone_event_handler::ZoneEventHandler,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greeter_hub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting greeter-hub v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = AppConfig::default();
    tracing::info!(
        mqtt_broker = %format!("{}:{}", config.mqtt_broker_host, config.mqtt_broker_port),
        meraki_base_url = %config.meraki_base_url,
        data_api_base_url = %config.data_api_base_url,
        cameras_file = %config.cameras_file,
        "Configuration loaded"
    );

    // Load static camera directory
    let directory = Arc::new(CameraDirectory::load(&config.cameras_file)?);
    tracing::info!(
        cameras = directory.cameras().len(),
        "CameraDirectory loaded"
    );

    // Initialize components
    let occupancy = Arc::new(OccupancyStore::new());
    let meraki = Arc::new(MerakiClient::new(
        config.meraki_base_url.clone(),
        config.meraki_api_key.clone(),
    ));
    let identity = Arc::new(IdentityClient::new(config.data_api_base_url.clone()));
    let booking = Arc::new(BookingClient::new(config.data_api_base_url.clone()));
    let dispatcher = Arc::new(Dispatcher::new());
    tracing::info!("External service clients initialized");

    // Entry workflow and its worker pool
    let workflow = Arc::new(EntryWorkflow::new(
        directory.clone(),
        meraki.clone(),
        identity.clone(),
        booking.clone(),
        dispatcher.clone(),
        config.step_timeout(),
    ));
    let workflow_queue = WorkflowQueue::start(
        workflow,
        config.workflow_workers,
        config.workflow_queue_capacity,
    );
    tracing::info!(
        workers = config.workflow_workers,
        queue_capacity = config.workflow_queue_capacity,
        "Workflow worker pool started"
    );

    // Zone event handler and telemetry ingress
    let zone_handler = Arc::new(ZoneEventHandler::new(
        directory.clone(),
        occupancy.clone(),
        workflow_queue.clone(),
    ));
    let ingress = EventIngress::new(
        zone_handler,
        directory.clone(),
        config.mqtt_broker_host.clone(),
        config.mqtt_broker_port,
        config.mqtt_client_id.clone(),
    );
    let mqtt_connected = ingress.connected_flag();
    tokio::spawn(ingress.run());
    tracing::info!("EventIngress started");

    // Create application state
    let state = AppState {
        config,
        directory,
        occupancy,
        booking,
        dispatcher,
        workflow_queue,
        mqtt_connected,
    };

    // Create router
    let app = web_api::create_router(state.clone())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
