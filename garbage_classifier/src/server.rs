use crate::{
    classifier::GarbageClassifier, config::Config, inference_service::InferenceService,
    model_service::ModelBackend,
};
use garbage_proto::garbage_classifier_service_server::GarbageClassifierServiceServer;
use tokio::signal;
use tonic::transport::server::Router;
use tonic::transport::Server;

pub struct GrpcServer {
    router: Router,
    addr: String,
}

impl GrpcServer {
    pub async fn new<B: ModelBackend>(
        classifier: GarbageClassifier<B>,
        max_results: usize,
        addr: &str,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let inference_service = InferenceService::new(classifier, max_results);

        let reflection_service = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(garbage_proto::FILE_DESCRIPTOR_SET)
            .build_v1()?;

        let (health_reporter, health_service) = tonic_health::server::health_reporter();
        health_reporter
            .set_serving::<GarbageClassifierServiceServer<InferenceService<B>>>()
            .await;

        let router = Server::builder()
            .add_service(health_service)
            .add_service(GarbageClassifierServiceServer::new(inference_service))
            .add_service(reflection_service);

        Ok(Self {
            router,
            addr: addr.to_string(),
        })
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.addr.parse()?;

        tracing::info!("Classification service listening on {}", self.addr);

        let shutdown = async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown")
        };

        self.router.serve_with_shutdown(addr, shutdown).await?;
        Ok(())
    }
}

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let classifier = GarbageClassifier::from_config(&config.model, &config.labels)?;

    let addr = config.server.get_address();
    let grpc_server = GrpcServer::new(classifier, config.service.max_results, &addr).await?;

    grpc_server.run().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
