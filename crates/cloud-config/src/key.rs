//! Naming of the per-pool bootstrap resources.

use crds::CriName;
use semver::Version;
use sha2::{Digest, Sha256};

/// Derives the key naming the OperatingSystemConfigs and the payload secret
/// of a worker pool.
///
/// The key only changes when the pool name, the Kubernetes minor version or
/// the container runtime change. Docker is the default runtime and does not
/// contribute to the hash. Returns an empty string without a version.
pub fn key(worker_name: &str, kubernetes_version: Option<&Version>, cri: Option<&CriName>) -> String {
    let Some(version) = kubernetes_version else {
        return String::new();
    };

    let cri_name = match cri {
        Some(CriName::Containerd) => CriName::Containerd.as_str(),
        Some(CriName::Docker) | None => "",
    };

    let digest = Sha256::digest(format!("{}.{}{}", version.major, version.minor, cri_name));
    let hash = hex::encode(digest);
    format!("cloud-config-{}-{}", worker_name, &hash[..5])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_key_table() {
        let cases = [
            ("worker1", "1.27.0", None, "cloud-config-worker1-628fd"),
            ("worker1", "1.27.0", Some(CriName::Docker), "cloud-config-worker1-628fd"),
            ("worker1", "1.27.0", Some(CriName::Containerd), "cloud-config-worker1-8a8eb"),
            ("worker1", "1.28.4", None, "cloud-config-worker1-88db5"),
            ("worker1", "1.28.4", Some(CriName::Containerd), "cloud-config-worker1-f76b6"),
            ("pool-b", "1.26.1", None, "cloud-config-pool-b-e6948"),
            ("pool-b", "1.30.0", Some(CriName::Docker), "cloud-config-pool-b-26fe8"),
        ];

        for (name, version, cri, expected) in cases {
            assert_eq!(key(name, Some(&v(version)), cri.as_ref()), expected, "{name} {version} {cri:?}");
        }
    }

    #[test]
    fn test_key_ignores_patch_version() {
        let a = key("worker1", Some(&v("1.27.0")), Some(&CriName::Containerd));
        let b = key("worker1", Some(&v("1.27.9")), Some(&CriName::Containerd));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_changes_with_minor_and_cri() {
        let base = key("worker1", Some(&v("1.27.0")), None);
        assert_ne!(base, key("worker1", Some(&v("1.28.0")), None));
        assert_ne!(base, key("worker1", Some(&v("1.27.0")), Some(&CriName::Containerd)));
        assert_ne!(base, key("worker2", Some(&v("1.27.0")), None));
    }

    #[test]
    fn test_key_without_version() {
        assert_eq!(key("worker1", None, Some(&CriName::Containerd)), "");
    }
}
