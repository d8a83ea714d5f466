//! Prints the CustomResourceDefinitions of this workspace as a YAML stream.

use crds::{OperatingSystemConfig, Shoot, Worker};
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    let crds = [
        OperatingSystemConfig::crd(),
        Worker::crd(),
        Shoot::crd(),
    ];

    for crd in &crds {
        println!("---");
        print!("{}", serde_yaml::to_string(crd)?);
    }
    Ok(())
}
