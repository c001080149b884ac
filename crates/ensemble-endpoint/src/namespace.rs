use std::path::Path;

/// Default path Kubernetes mounts the pod's namespace at via the
/// service-account projection.
const SERVICE_ACCOUNT_NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Resolve the namespace the endpoint should operate in: the contents of the
/// mounted service-account file when running in Kubernetes mode, or
/// `"default"` otherwise (SPEC_FULL.md §6).
pub fn resolve_namespace(kubernetes_mode: bool) -> String {
    if !kubernetes_mode {
        return "default".to_string();
    }
    resolve_namespace_from(Path::new(SERVICE_ACCOUNT_NAMESPACE_FILE))
}

fn resolve_namespace_from(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(contents) => contents.trim().to_string(),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "could not read service-account namespace file, defaulting to 'default'"
            );
            "default".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_kubernetes_mode_is_always_default() {
        assert_eq!(resolve_namespace(false), "default");
    }

    #[test]
    fn reads_trimmed_namespace_from_file() {
        let path = std::env::temp_dir().join(format!("ensemble-namespace-test-{}", std::process::id()));
        std::fs::write(&path, "my-namespace\n").unwrap();
        assert_eq!(resolve_namespace_from(&path), "my-namespace");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        assert_eq!(
            resolve_namespace_from(Path::new("/nonexistent/namespace")),
            "default"
        );
    }
}
