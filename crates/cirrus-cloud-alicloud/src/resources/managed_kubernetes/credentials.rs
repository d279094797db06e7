//! Writing cluster certificates and kubeconfig to caller-chosen paths

use super::args::ManagedKubernetesConfig;
use crate::client::AlicloudClient;
use cirrus_cloud::Result;
use std::path::PathBuf;

/// Materialize the credentials the configuration asks for.
///
/// Nothing is fetched for a destination that is not configured.
pub async fn write_credentials(
    client: &AlicloudClient,
    cluster_id: &str,
    config: &ManagedKubernetesConfig,
) -> Result<()> {
    if config.wants_certs() {
        let certs = client
            .invoker()
            .run(|| client.cs().get_cluster_certs(cluster_id))
            .await?;

        for (path, contents) in [
            (&config.client_cert, &certs.cert),
            (&config.client_key, &certs.key),
            (&config.cluster_ca_cert, &certs.ca),
        ] {
            if !path.is_empty() {
                write_to_file(path, contents).await?;
            }
        }
    }

    if !config.kube_config.is_empty() {
        let kube_config = client
            .invoker()
            .run(|| client.cs().get_cluster_config(cluster_id))
            .await?;
        write_to_file(&config.kube_config, &kube_config.config).await?;
    }

    Ok(())
}

/// Replace the file at `path` with `contents`.
pub async fn write_to_file(path: &str, contents: &str) -> Result<()> {
    let path = expand_home(path);

    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    tokio::fs::write(&path, contents).await?;
    tracing::debug!(path = %path.display(), "wrote cluster credential");
    Ok(())
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
