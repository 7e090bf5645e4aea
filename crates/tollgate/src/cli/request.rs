//! `tollgate request` handler.

use super::commands::RequestArgs;
use std::sync::Arc;
use std::time::Duration;
use tollgate::{
    ApiGateway, ConfigError, GatewayError, Method, RequestOptions, StaticTokenProvider,
    TokenProvider, TollgateConfig, TollgateResult, TracingNotifier,
};
use tracing::{info, warn};

/// Send one request and print the response, or the classified failure.
pub async fn run_request(
    config: &TollgateConfig,
    args: RequestArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::new(format!("Invalid HTTP method '{}'", args.method)))?;

    let provider = token_provider(config, args.token, args.refresh_token)?;
    let gateway = ApiGateway::from_config(config, provider, Arc::new(TracingNotifier))?;

    let mut builder = RequestOptions::builder();
    builder.skip_auth(args.skip_auth);
    if let Some(body) = &args.json {
        let json: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| ConfigError::new(format!("--json is not valid JSON: {}", e)))?;
        builder.json(json);
    }
    if let Some(ms) = args.timeout_ms {
        builder.timeout(Duration::from_millis(ms));
    }
    let options = builder
        .build()
        .map_err(|e| ConfigError::new(format!("Invalid request options: {}", e)))?;

    match gateway.call(args.class, method, &args.path, options).await {
        Ok(response) => {
            println!("HTTP {}", response.status);
            let text = response.text();
            if !text.is_empty() {
                println!("{}", text);
            }
            Ok(())
        }
        Err(GatewayError::Throttled { class, retry_after }) => {
            eprintln!(
                "Throttled: {} limit reached, retry in {:.1}s",
                class,
                retry_after.as_secs_f64()
            );
            Err(GatewayError::Throttled { class, retry_after }.into())
        }
        Err(GatewayError::Transport(err)) => {
            match err.status_code {
                Some(status) => eprintln!("{} (HTTP {}): {}", err.kind, status, err.message),
                None => eprintln!("{}: {}", err.kind, err.message),
            }
            Err(err.into())
        }
    }
}

/// A refresh-grant provider when a refresh token is given, else a fixed token.
fn token_provider(
    config: &TollgateConfig,
    token: Option<String>,
    refresh_token: Option<String>,
) -> TollgateResult<Arc<dyn TokenProvider>> {
    if let Some(refresh_token) = refresh_token {
        let provider = config
            .refresh_grant_provider()?
            .ok_or_else(|| ConfigError::new("--refresh-token needs an [auth] section"))?
            .on_reauthenticate(|| warn!("Refresh token rejected, sign in again"));
        provider.resume(refresh_token);
        return Ok(Arc::new(provider));
    }

    Ok(match token {
        Some(token) => Arc::new(StaticTokenProvider::new(token)),
        None => {
            info!("No access token supplied, sending anonymously");
            Arc::new(StaticTokenProvider::anonymous())
        }
    })
}
