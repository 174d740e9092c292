use crate::vitals::{Reading, VitalsSnapshot};

pub const TITLE: &str = "vitals-glimpse";
pub const VERSION: &str = "0.4";

/// JSON body of a successful vitals response.
///
/// Field order is part of the wire format consumed by uptime monitors.
#[derive(Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VitalsResponse {
    pub title: String,
    pub version: String,
    pub mem_status: String,
    pub mem_percent: i32,
    pub disk_status: String,
    pub disk_percent: i32,
    pub cpu_status: String,
    pub cpu_percent: i32,
}

/// Renders a status keyword such as `mem_okay` or `cpu_fail`.
fn status(metric: &str, reading: &Reading) -> String {
    format!("{metric}_{}", reading.health)
}

impl From<&VitalsSnapshot> for VitalsResponse {
    fn from(snapshot: &VitalsSnapshot) -> Self {
        Self {
            title: TITLE.to_owned(),
            version: VERSION.to_owned(),
            mem_status: status("mem", &snapshot.memory),
            mem_percent: snapshot.memory.percent,
            disk_status: status("disk", &snapshot.disk),
            disk_percent: snapshot.disk.percent,
            cpu_status: status("cpu", &snapshot.cpu),
            cpu_percent: snapshot.cpu.percent,
        }
    }
}
