//! Log rotation for docker container logs.

use super::{Component, Context};
use crate::error::Result;
use crds::{File, Unit};

const PATH_LOGROTATE_CONFIG: &str = "/etc/systemd/docker.conf";

/// Rotates docker container logs hourly.
#[derive(Debug)]
pub struct DockerLogrotate;

impl Component for DockerLogrotate {
    fn name(&self) -> &'static str {
        "docker-logrotate"
    }

    fn config(&self, _ctx: &Context<'_>) -> Result<(Vec<Unit>, Vec<File>)> {
        let service = Unit {
            name: "docker-logrotate.service".to_string(),
            command: None,
            enable: Some(true),
            content: Some(format!(
                "[Unit]
Description=Rotate and Compress System Logs
[Service]
ExecStart=/usr/sbin/logrotate -s /var/lib/docker-logrotate.status {PATH_LOGROTATE_CONFIG}
[Install]
WantedBy=multi-user.target
"
            )),
            drop_ins: Vec::new(),
        };

        let timer = Unit::started(
            "docker-logrotate.timer",
            "[Unit]
Description=Log Rotation at each hour
[Timer]
OnCalendar=*-*-* *:00:00
AccuracySec=1min
Persistent=true
[Install]
WantedBy=multi-user.target
",
        );

        let config = "/var/lib/docker/containers/*/*.log {
    rotate 5
    copytruncate
    missingok
    notifempty
    compress
    maxsize 100M
    daily
    dateext
    dateformat -%Y%m%d-%s
    create 0644 root root
}
";

        Ok((
            vec![service, timer],
            vec![File::inline_base64(PATH_LOGROTATE_CONFIG, 0o644, config)],
        ))
    }
}
