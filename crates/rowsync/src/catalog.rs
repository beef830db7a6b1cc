//! Schemas of the maintenance report tables.
//!
//! Server preventive-maintenance reports carry the server health, hard drive
//! health, time sync and ASA firewall tables. Corrective-maintenance reports
//! carry the material-used table. RTU preventive-maintenance reports carry
//! the four RTU tables, whose equipment lists depend on the station.

use rowsync_api::Fields;
use rowsync_core::AutofillRule;

use crate::schema::{ReferenceLookup, SectionSchema};

pub const SERVER_HEALTH: &str = "server_health";
pub const HARD_DRIVE_HEALTH: &str = "hard_drive_health";
pub const TIME_SYNC: &str = "time_sync";
pub const ASA_FIREWALL: &str = "asa_firewall";
pub const CM_MATERIAL_USED: &str = "cm_material_used";
pub const RTU_MAIN_CABINET: &str = "rtu_main_cabinet";
pub const RTU_CHAMBER_CONTACTS: &str = "rtu_chamber_contacts";
pub const RTU_PM_EQUIPMENT: &str = "rtu_pm_equipment";
pub const RTU_PM_REMARKS: &str = "rtu_pm_remarks";

/// Reference lookup keys
pub mod lookups {
    pub const RESULT_STATUS: &str = "result_status";
    pub const YES_NO_STATUS: &str = "yes_no_status";
    pub const ASA_EXPECTED_RESULTS: &str = "asa_expected_results";
    pub const MATERIALS: &str = "materials";
    pub const RTU_DEVICES: &str = "rtu_devices";
    pub const CABINET_STATUS: &str = "cabinet_status";
    pub const CHAMBERS: &str = "chambers";
}

const PM_REPORT_LINK: &str = "pmReportFormId";
const CM_REPORT_LINK: &str = "cmReportFormId";
const RTU_REPORT_LINK: &str = "rtuPmReportFormId";

/// Commands every ASA firewall check runs, in report order.
const ASA_COMMANDS: &[(&str, &str)] = &[
    ("show cpu usage", "CPU usage below threshold"),
    ("show environment", "All sensors normal"),
    ("show failover", "Active/Standby Ready"),
    ("show interface ip brief", "All interfaces up"),
    ("show version", "Version Reported"),
];

pub fn server_health() -> SectionSchema {
    SectionSchema::new(SERVER_HEALTH)
        .require(["serverName", "resultStatusId"])
        .lookup(ReferenceLookup::global(lookups::RESULT_STATUS))
        .parent_link(PM_REPORT_LINK)
}

pub fn hard_drive_health() -> SectionSchema {
    SectionSchema::new(HARD_DRIVE_HEALTH)
        .require(["serverName", "driveLetter", "resultStatusId"])
        .lookup(ReferenceLookup::global(lookups::RESULT_STATUS))
        .parent_link(PM_REPORT_LINK)
}

pub fn time_sync() -> SectionSchema {
    SectionSchema::new(TIME_SYNC)
        .require(["machineName", "timeSyncResultId"])
        .lookup(ReferenceLookup::global(lookups::YES_NO_STATUS))
        .parent_link(PM_REPORT_LINK)
}

pub fn asa_firewall() -> SectionSchema {
    let rule = ASA_COMMANDS.iter().fold(
        AutofillRule::new(
            "commandInput",
            "expectedResultId",
            lookups::ASA_EXPECTED_RESULTS,
        ),
        |rule, (command, expected)| rule.map(*command, *expected),
    );
    let schema = SectionSchema::new(ASA_FIREWALL)
        .require(["commandInput", "expectedResultId", "doneId"])
        .autofill(rule)
        .lookup(ReferenceLookup::global(lookups::ASA_EXPECTED_RESULTS))
        .lookup(ReferenceLookup::global(lookups::YES_NO_STATUS))
        .parent_link(PM_REPORT_LINK);
    ASA_COMMANDS.iter().fold(schema, |schema, (command, _)| {
        schema.seed(Fields::from([("commandInput", *command)]))
    })
}

pub fn cm_material_used() -> SectionSchema {
    SectionSchema::new(CM_MATERIAL_USED)
        .require(["itemDescription", "quantity"])
        .lookup(ReferenceLookup::scoped(lookups::MATERIALS))
        .parent_link(CM_REPORT_LINK)
}

pub fn rtu_main_cabinet() -> SectionSchema {
    SectionSchema::new(RTU_MAIN_CABINET)
        .require(["rtuDeviceId", "cabinetStatusId"])
        .lookup(ReferenceLookup::scoped(lookups::RTU_DEVICES))
        .lookup(ReferenceLookup::global(lookups::CABINET_STATUS))
        .parent_link(RTU_REPORT_LINK)
}

pub fn rtu_chamber_contacts() -> SectionSchema {
    SectionSchema::new(RTU_CHAMBER_CONTACTS)
        .require(["chamberId", "contactStatusId"])
        .lookup(ReferenceLookup::scoped(lookups::CHAMBERS))
        .lookup(ReferenceLookup::global(lookups::RESULT_STATUS))
        .parent_link(RTU_REPORT_LINK)
}

pub fn rtu_pm_equipment() -> SectionSchema {
    SectionSchema::new(RTU_PM_EQUIPMENT)
        .require(["rtuDeviceId", "equipmentStatusId"])
        .lookup(ReferenceLookup::scoped(lookups::RTU_DEVICES))
        .lookup(ReferenceLookup::global(lookups::RESULT_STATUS))
        .parent_link(RTU_REPORT_LINK)
}

pub fn rtu_pm_remarks() -> SectionSchema {
    SectionSchema::new(RTU_PM_REMARKS)
        .require(["remarkText"])
        .parent_link(RTU_REPORT_LINK)
}

/// Every known table schema.
pub fn all() -> Vec<SectionSchema> {
    vec![
        server_health(),
        hard_drive_health(),
        time_sync(),
        asa_firewall(),
        cm_material_used(),
        rtu_main_cabinet(),
        rtu_chamber_contacts(),
        rtu_pm_equipment(),
        rtu_pm_remarks(),
    ]
}

pub fn by_name(name: &str) -> Option<SectionSchema> {
    all().into_iter().find(|schema| schema.name == name)
}

/// Tables of a server preventive-maintenance report, in form order.
pub fn server_pm_sections() -> Vec<SectionSchema> {
    vec![server_health(), hard_drive_health(), time_sync(), asa_firewall()]
}

/// Tables of an RTU preventive-maintenance report, in form order.
pub fn rtu_pm_sections() -> Vec<SectionSchema> {
    vec![
        rtu_main_cabinet(),
        rtu_chamber_contacts(),
        rtu_pm_equipment(),
        rtu_pm_remarks(),
    ]
}

/// Tables of a corrective-maintenance report.
pub fn cm_sections() -> Vec<SectionSchema> {
    vec![cm_material_used()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique_and_resolvable() {
        let names: HashSet<String> = all().into_iter().map(|s| s.name).collect();
        assert_eq!(names.len(), 9);
        for name in &names {
            assert_eq!(by_name(name).map(|s| s.name), Some(name.clone()));
        }
        assert!(by_name("pdf_layout").is_none());
    }

    #[test]
    fn test_rtu_tables_depend_on_station() {
        for schema in rtu_pm_sections().iter().take(3) {
            assert!(schema.has_scoped_lookups(), "{} should be station scoped", schema.name);
        }
        assert!(!server_health().has_scoped_lookups());
    }

    #[test]
    fn test_asa_firewall_seeds_one_row_per_command() {
        let schema = asa_firewall();
        assert_eq!(schema.seed_rows.len(), ASA_COMMANDS.len());
        assert_eq!(schema.autofill[0].mapping.len(), ASA_COMMANDS.len());
    }
}
