//! Azure Cache for Redis settings.
//!
//! Most checks here are cross-field: zones only with a user defined zonal
//! policy, geo replication and RDB backup only on Premium.

use super::checks::{Section, Validator};
use serde_json::Value;

const SKU_NAMES: [&str; 3] = ["Basic", "Standard", "Premium"];
const SCALE_STRATEGIES: [&str; 2] = ["vertical", "horizontal"];
const ZONAL_POLICIES: [&str; 3] = ["Automatic", "NoZones", "UserDefined"];
const ZONES: [&str; 3] = ["1", "2", "3"];
const RDB_FREQUENCIES: [i64; 6] = [15, 30, 60, 360, 720, 1440];

pub(super) fn check_redis(v: &mut Validator, redis: &Section) {
    let sku = v.non_empty_str(redis, "skuName");
    v.one_of(sku, &redis.path("skuName"), &SKU_NAMES);
    let premium = sku == Some("Premium");

    let capacity = v.int(redis, "capacity");
    v.at_least(capacity, &redis.path("capacity"), 0);

    let shards = v.int(redis, "shardCount");
    v.at_least(shards, &redis.path("shardCount"), 1);

    let strategy = v.non_empty_str(redis, "scaleStrategy");
    v.one_of(strategy, &redis.path("scaleStrategy"), &SCALE_STRATEGIES);

    if let Some(capacity) = capacity {
        let capacity_path = redis.path("capacity");
        match sku {
            Some("Basic") | Some("Standard") if !(0..=6).contains(&capacity) => {
                v.error(&capacity_path, "must be between 0 and 6 for Basic/Standard")
            }
            Some("Premium") if !(1..=6).contains(&capacity) => {
                v.error(&capacity_path, "must be between 1 and 6 for Premium")
            }
            _ => {}
        }
    }

    let policy = v.non_empty_str(redis, "zonalAllocationPolicy");
    v.one_of(policy, &redis.path("zonalAllocationPolicy"), &ZONAL_POLICIES);

    let zones_path = redis.path("zones");
    let zone_count = match redis.get("zones") {
        Some(Value::Array(zones)) => {
            for (i, zone) in zones.iter().enumerate() {
                if !zone.as_str().is_some_and(|z| ZONES.contains(&z)) {
                    v.error(&format!("{zones_path}[{i}]"), "must be '1', '2' or '3'");
                }
            }
            zones.len()
        }
        _ => {
            v.error(&zones_path, "must be an array of zone numbers (empty when unset)");
            0
        }
    };

    let replicas = v.int(redis, "replicasPerMaster");
    v.at_least(replicas, &redis.path("replicasPerMaster"), 0);

    let geo_replication = v.bool(redis, "enableGeoReplication") == Some(true);
    let entra = v.bool(redis, "enableMicrosoftEntraAuthentication");
    let access_keys_disabled = v.bool(redis, "disableAccessKeyAuthentication");

    if policy == Some("UserDefined") {
        if !premium {
            v.error(
                &redis.path("zonalAllocationPolicy"),
                "UserDefined is only allowed with skuName Premium",
            );
        }
        if zone_count == 0 {
            v.error(&zones_path, "needs at least one zone when zonalAllocationPolicy is UserDefined");
        }
    } else if zone_count > 0 {
        v.error(&zones_path, "only allowed when zonalAllocationPolicy is UserDefined");
    }

    if geo_replication {
        if !premium {
            v.error(
                &redis.path("enableGeoReplication"),
                "true is only allowed with skuName Premium",
            );
        }
        if replicas.is_some_and(|r| r != 1) {
            v.error(
                &redis.path("replicasPerMaster"),
                "must be 1 when enableGeoReplication is true",
            );
        }
    }

    if access_keys_disabled == Some(true) && entra == Some(false) {
        v.error(
            &redis.path("disableAccessKeyAuthentication"),
            "true requires enableMicrosoftEntraAuthentication to be true",
        );
    }

    let custom_window = v.bool(redis, "enableCustomMaintenanceWindow") == Some(true);
    if let Some(window) = v.optional_section(
        redis,
        "maintenanceWindow",
        custom_window,
        "required when enableCustomMaintenanceWindow is true",
    ) {
        if custom_window {
            check_maintenance_window(v, &window);
        }
    }

    let rdb_backup = v.bool(redis, "enableRdbBackup") == Some(true);
    let frequency = v.int(redis, "rdbBackupFrequencyInMinutes");
    let snapshots = v.int(redis, "rdbBackupMaxSnapshotCount");
    let connection_string = v.string(redis, "rdbStorageConnectionString", "");

    if let Some(frequency) = frequency {
        if !RDB_FREQUENCIES.contains(&frequency) {
            v.error(
                &redis.path("rdbBackupFrequencyInMinutes"),
                "must be one of 15 / 30 / 60 / 360 / 720 / 1440",
            );
        }
    }
    v.at_least(snapshots, &redis.path("rdbBackupMaxSnapshotCount"), 1);

    // Basic and Standard ignore RDB backup downstream.
    if rdb_backup && premium && connection_string.is_some_and(|s| s.trim().is_empty()) {
        v.error(
            &redis.path("rdbStorageConnectionString"),
            "must name the backup storage when enableRdbBackup is true",
        );
    }
}

fn check_maintenance_window(v: &mut Validator, window: &Section) {
    let day = v.int(window, "dayOfWeek");
    let hour = v.int(window, "startHour");
    v.in_range(day, &window.path("dayOfWeek"), 0, 6);
    v.in_range(hour, &window.path("startHour"), 0, 23);

    let iso_hours = window
        .get("duration")
        .and_then(Value::as_str)
        .is_some_and(|d| d.starts_with("PT") && d.ends_with('H'));
    if !iso_hours {
        v.error(
            &window.path("duration"),
            "must be an ISO 8601 duration in hours (e.g. PT5H)",
        );
    }
}
