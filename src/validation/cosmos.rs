//! Cosmos DB (NoSQL) throughput, backup and replication settings.

use super::checks::{Section, Validator};
use serde_json::Value;

const THROUGHPUT_MODES: [&str; 3] = ["Manual", "Autoscale", "Serverless"];
const BACKUP_POLICIES: [&str; 2] = ["Periodic", "Continuous"];
const REDUNDANCIES: [&str; 3] = ["Geo", "Local", "Zone"];
const CONTINUOUS_TIERS: [&str; 2] = ["Continuous7Days", "Continuous30Days"];
const CONSISTENCY_LEVELS: [&str; 5] = [
    "Strong",
    "BoundedStaleness",
    "Session",
    "ConsistentPrefix",
    "Eventual",
];

/// Retention must keep at least two backups.
pub fn min_retention_hours(interval_minutes: i64) -> i64 {
    ((interval_minutes * 2) as f64 / 60.0).ceil() as i64
}

pub(super) fn check_cosmos(v: &mut Validator, cosno: &Section) {
    let mode = v.non_empty_str(cosno, "throughputMode");
    v.one_of(mode, &cosno.path("throughputMode"), &THROUGHPUT_MODES);

    let manual = v.int(cosno, "manualThroughputRu");
    v.at_least(manual, &cosno.path("manualThroughputRu"), 400);
    let autoscale = v.int(cosno, "autoscaleMaxThroughputRu");
    v.at_least(autoscale, &cosno.path("autoscaleMaxThroughputRu"), 1000);

    let policy = v.non_empty_str(cosno, "backupPolicyType");
    v.one_of(policy, &cosno.path("backupPolicyType"), &BACKUP_POLICIES);

    let interval = v.int(cosno, "periodicBackupIntervalInMinutes");
    v.in_range(interval, &cosno.path("periodicBackupIntervalInMinutes"), 60, 1440);
    let retention_path = cosno.path("periodicBackupRetentionIntervalInHours");
    let retention = v.int(cosno, "periodicBackupRetentionIntervalInHours");
    v.in_range(retention, &retention_path, 8, 720);

    let redundancy = v.non_empty_str(cosno, "periodicBackupStorageRedundancy");
    v.one_of(
        redundancy,
        &cosno.path("periodicBackupStorageRedundancy"),
        &REDUNDANCIES,
    );
    let tier = v.non_empty_str(cosno, "continuousBackupTier");
    v.one_of(tier, &cosno.path("continuousBackupTier"), &CONTINUOUS_TIERS);

    if let (Some("Periodic"), Some(interval), Some(retention)) = (policy, interval, retention) {
        let min = min_retention_hours(interval);
        if retention < min {
            v.error(
                &retention_path,
                format!(
                    "must keep at least twice periodicBackupIntervalInMinutes ({min} hours for {interval} minutes)"
                ),
            );
        }
    }

    let regions_path = cosno.path("failoverRegions");
    match cosno.get("failoverRegions") {
        Some(Value::Array(regions)) => {
            for (i, region) in regions.iter().enumerate() {
                if !region.as_str().is_some_and(|r| !r.trim().is_empty()) {
                    v.error(
                        &format!("{regions_path}[{i}]"),
                        "must be a non-empty region name",
                    );
                }
            }
        }
        _ => v.error(&regions_path, "must be an array of strings (empty when unset)"),
    }

    v.bool(cosno, "enableAutomaticFailover");
    v.bool(cosno, "enableMultipleWriteLocations");
    v.bool(cosno, "disableLocalAuth");
    v.bool(cosno, "disableKeyBasedMetadataWriteAccess");

    let consistency = v.non_empty_str(cosno, "consistencyLevel");
    v.one_of(
        consistency,
        &cosno.path("consistencyLevel"),
        &CONSISTENCY_LEVELS,
    );
}
