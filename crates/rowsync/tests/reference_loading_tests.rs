use rowsync::catalog::{self, lookups};
use rowsync::{Fields, MemoryReferenceData, OptionItem, ReferenceDataLoader, ReportForm, Section, Value};
use std::sync::Arc;

fn rtu_source() -> MemoryReferenceData {
    MemoryReferenceData::new()
        .with(lookups::RTU_DEVICES, Some("ST-01"), vec![OptionItem::new(1, "RTU A")])
        .with(lookups::RTU_DEVICES, Some("ST-02"), vec![OptionItem::new(2, "RTU B")])
        .with(lookups::CABINET_STATUS, None, vec![OptionItem::new(5, "Clean")])
}

#[tokio::test]
async fn test_mount_fetches_scoped_and_global_lookups() {
    let source = rtu_source();
    let mut loader = ReferenceDataLoader::new(Arc::new(source.clone()));
    let mut section = Section::new(catalog::rtu_main_cabinet());

    assert_eq!(loader.mount(&mut section, Some("ST-01")).await, 0);

    assert_eq!(
        source.fetches(),
        vec![
            (lookups::RTU_DEVICES.to_string(), Some("ST-01".to_string())),
            (lookups::CABINET_STATUS.to_string(), None),
        ]
    );
    let devices = section.collection().reference_options(lookups::RTU_DEVICES);
    assert_eq!(devices, &[OptionItem::new(1, "RTU A")]);
    assert_eq!(loader.scope_of(catalog::RTU_MAIN_CABINET), Some("ST-01"));
}

#[tokio::test]
async fn test_scope_change_refetches_only_scoped_lookups() {
    let source = rtu_source();
    let mut loader = ReferenceDataLoader::new(Arc::new(source.clone()));
    let mut section = Section::new(catalog::rtu_main_cabinet());
    loader.mount(&mut section, Some("ST-01")).await;

    assert!(!loader.change_scope(&mut section, Some("ST-01")).await);
    assert_eq!(source.fetches().len(), 2);

    assert!(loader.change_scope(&mut section, Some("ST-02")).await);
    let fetches = source.fetches();
    assert_eq!(fetches.len(), 3);
    assert_eq!(
        fetches[2],
        (lookups::RTU_DEVICES.to_string(), Some("ST-02".to_string()))
    );
    assert_eq!(
        section.collection().reference_options(lookups::RTU_DEVICES)[0].name,
        "RTU B"
    );
    assert_eq!(
        section.collection().reference_options(lookups::CABINET_STATUS).len(),
        1
    );
}

#[tokio::test]
async fn test_failed_lookup_degrades_to_empty_options() {
    let source = rtu_source();
    source.fail(lookups::RTU_DEVICES);
    let mut loader = ReferenceDataLoader::new(Arc::new(source));
    let mut section = Section::new(catalog::rtu_main_cabinet());

    assert_eq!(loader.mount(&mut section, Some("ST-01")).await, 1);
    assert!(section.collection().reference_options(lookups::RTU_DEVICES).is_empty());
    assert_eq!(
        section.collection().reference_options(lookups::CABINET_STATUS).len(),
        1
    );

    let position = section.add_row(Fields::from([("rtuDeviceId", 1)]));
    assert!(section.edit_field(position, "cabinetStatusId", 5).unwrap());
}

#[tokio::test]
async fn test_mounting_a_new_firewall_report_autofills_expected_results() {
    let source = MemoryReferenceData::new().with(
        lookups::ASA_EXPECTED_RESULTS,
        None,
        vec![
            OptionItem::new(21, "Active/Standby Ready"),
            OptionItem::new(22, "Version Reported"),
        ],
    );
    let mut loader = ReferenceDataLoader::new(Arc::new(source));
    let mut form = ReportForm::for_new_report(vec![catalog::asa_firewall()]);

    assert_eq!(loader.mount_form(&mut form, None).await, 0);

    let section = form.section(catalog::ASA_FIREWALL).unwrap();
    let expected: Vec<Option<&Value>> = section
        .collection()
        .rows()
        .iter()
        .map(|r| r.get("expectedResultId"))
        .collect();
    assert_eq!(
        expected,
        vec![
            None,
            None,
            Some(&Value::Integer(21)),
            None,
            Some(&Value::Integer(22))
        ]
    );

    let position = section
        .collection()
        .rows()
        .iter()
        .position(|r| r.get("commandInput") == Some(&Value::from("show cpu usage")))
        .unwrap();
    let section = form.section_mut(catalog::ASA_FIREWALL).unwrap();
    section.edit_field(position, "commandInput", "show version").unwrap();
    assert_eq!(
        section.collection().row(position).unwrap().get("expectedResultId"),
        Some(&Value::Integer(22))
    );
}

#[tokio::test]
async fn test_form_scope_change_refetches_only_on_new_station() {
    let source = rtu_source();
    let mut loader = ReferenceDataLoader::new(Arc::new(source.clone()));
    let mut form = ReportForm::for_report("rtu-3", catalog::rtu_pm_sections());
    loader.mount_form(&mut form, Some("ST-01")).await;

    assert_eq!(loader.change_form_scope(&mut form, Some("ST-01")).await, 0);
    assert_eq!(loader.change_form_scope(&mut form, Some("ST-02")).await, 4);
    assert_eq!(loader.scope_of(catalog::RTU_PM_REMARKS), Some("ST-02"));
}
