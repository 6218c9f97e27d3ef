use crate::config::{AppConfig, GenerationConfig, HTTPConfig};
use crate::generation::GeminiGenerator;
use crate::http::create_app;
use crate::line::client::LineReplyClient;
use crate::line::dispatch::EventDispatcher;
use crate::line::signature::SignatureVerifier;
use crate::reply::{FallbackPolicy, ReplySelector};
use crate::TracingReloadHandle;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub struct AppHandles {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}
impl AppHandles {
    pub fn new(config: AppConfig, tracing_reload: TracingReloadHandle) -> Result<AppHandles> {
        let selector = ReplySelector::new(Self::fallback_policy(&config.generation)?);
        let replier = Arc::new(LineReplyClient::new(&config.line)?);
        let verifier = SignatureVerifier::new(&config.line.channel_secret)?;
        let dispatcher = EventDispatcher::new(selector, replier);

        let tasks = vec![
            (
                "HTTP Server",
                Self::start_http_server(config.http, dispatcher, verifier, tracing_reload),
            ),
            ("Shutdown Signal", Self::start_shutdown_listener()),
        ];

        Ok(AppHandles { tasks })
    }

    pub async fn run(self) {
        let futures: Vec<_> = self
            .tasks
            .into_iter()
            .map(|(name, handle)| {
                info!("Starting task: {name}");
                Box::pin(async move {
                    match handle.await {
                        Ok(_) => info!("{name} task completed!"),
                        Err(e) => error!("{name} task failed: {e:?}!"),
                    }
                })
            })
            .collect();

        // Wait for any task to complete. All handles are boxed, so when dropped they are cancelled.
        let (_, _, remaining) = futures::future::select_all(futures).await;
        drop(remaining);
    }

    fn fallback_policy(config: &GenerationConfig) -> Result<FallbackPolicy> {
        let api_key = match &config.api_key {
            Some(api_key) => api_key.clone(),
            None => {
                warn!("No generation API key configured, unmatched messages get a static reply");
                return Ok(FallbackPolicy::Static);
            }
        };

        info!("Using {} for unmatched messages", config.model);
        Ok(FallbackPolicy::Generate {
            generator: Arc::new(GeminiGenerator::new(config, api_key)?),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn start_shutdown_listener() -> JoinHandle<()> {
        tokio::spawn(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received shutdown signal"),
                Err(e) => error!("Failed to listen for shutdown signal: {e}"),
            }
        })
    }

    fn start_http_server(
        config: HTTPConfig,
        dispatcher: EventDispatcher,
        verifier: SignatureVerifier,
        tracing_reload: TracingReloadHandle,
    ) -> JoinHandle<()> {
        let address = config.address;
        let app = create_app(&config, dispatcher, verifier, tracing_reload);
        info!("Accepting LINE webhooks at {}", config.callback_path);

        tokio::spawn(async move {
            let result = match config.tls {
                Some(_tls_config) => {
                    #[cfg(any(feature = "tls-rustls", feature = "tls-native"))]
                    {
                        info!("Starting HTTPS (secure) server on {address}");

                        #[cfg(feature = "tls-rustls")]
                        {
                            let _ = rustls::crypto::CryptoProvider::install_default(
                                rustls::crypto::aws_lc_rs::default_provider(),
                            );
                            match axum_server::tls_rustls::RustlsConfig::from_pem_file(
                                &_tls_config.certificate_path,
                                &_tls_config.key_path,
                            )
                            .await
                            {
                                Ok(tls) => axum_server::bind_rustls(address, tls)
                                    .serve(app.into_make_service())
                                    .await
                                    .map_err(anyhow::Error::from),
                                Err(e) => Err(anyhow::anyhow!(
                                    "Failed to load rustls TLS certificates: {e}"
                                )),
                            }
                        }

                        #[cfg(all(feature = "tls-native", not(feature = "tls-rustls")))]
                        {
                            match axum_server::tls_openssl::OpenSSLConfig::from_pem_file(
                                &_tls_config.certificate_path,
                                &_tls_config.key_path,
                            ) {
                                Ok(tls) => axum_server::bind_openssl(address, tls)
                                    .serve(app.into_make_service())
                                    .await
                                    .map_err(anyhow::Error::from),
                                Err(e) => Err(anyhow::anyhow!(
                                    "Failed to load openssl TLS certificates: {e}"
                                )),
                            }
                        }
                    }

                    #[cfg(not(any(feature = "tls-rustls", feature = "tls-native")))]
                    Err(anyhow::anyhow!(
                        "HTTP Server TLS configuration provided but no TLS features enabled. Compile with a TLS backend feature!"
                    ))
                }
                None => {
                    info!("Starting HTTP (insecure) server on {address}");
                    axum_server::bind(address)
                        .serve(app.into_make_service())
                        .await
                        .map_err(anyhow::Error::from)
                }
            };

            if let Err(e) = result {
                error!("Server error: {e:?}");
            }
        })
    }
}
