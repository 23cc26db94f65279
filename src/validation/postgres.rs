//! PostgreSQL flexible server settings.

use super::checks::{Section, Validator};

const SKU_TIERS: [&str; 3] = ["Burstable", "GeneralPurpose", "MemoryOptimized"];

pub(super) fn check_postgres(v: &mut Validator, pg: &Section) {
    let tier = v.non_empty_str(pg, "skuTier");
    v.one_of(tier, &pg.path("skuTier"), &SKU_TIERS);
    v.non_empty_str(pg, "skuName");

    let storage = v.int(pg, "storageSizeGB");
    v.at_least(storage, &pg.path("storageSizeGB"), 32);

    v.bool(pg, "enableStorageAutoGrow");
    v.bool(pg, "enableZoneRedundantHa");
    v.bool(pg, "enableGeoRedundantBackup");

    let retention = v.int(pg, "backupRetentionDays");
    v.in_range(retention, &pg.path("backupRetentionDays"), 7, 35);

    let custom_window = v.bool(pg, "enableCustomMaintenanceWindow") == Some(true);
    if let Some(window) = v.optional_section(
        pg,
        "maintenanceWindow",
        custom_window,
        "required when enableCustomMaintenanceWindow is true",
    ) {
        if custom_window {
            let day = v.int(&window, "dayOfWeek");
            let hour = v.int(&window, "startHour");
            let minute = v.int(&window, "startMinute");
            v.in_range(day, &window.path("dayOfWeek"), 0, 6);
            v.in_range(hour, &window.path("startHour"), 0, 23);
            v.in_range(minute, &window.path("startMinute"), 0, 59);
        }
    }
}
