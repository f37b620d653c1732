use std::fs;

use chrono::{NaiveDate, NaiveTime};
use homecare_core::{
    refresh_patients, serves_need, PatientStatus, Program, RefreshGuard, Role, SchedulingConfig,
    SchedulingError, StaffStore, Therapy, TriggerStatus,
};
use homecare_roster::{
    estimate_staffing_str, parse_date, parse_patients_str, parse_patients_value, parse_staff_str,
    plan_route_str, JsonRosterStore, RouteRequest,
};
use serde_json::json;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR")))
        .expect("Không đọc được dữ liệu mẫu")
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("ngày hợp lệ")
}

#[test]
fn patients_resolve_labels_once() {
    let roster = parse_patients_str(&fixture("patients.json")).expect("JSON hợp lệ");
    assert_eq!(roster.patients.len(), 8);

    let bruno = roster.patients.iter().find(|p| p.id == "1002").expect("có 1002");
    assert_eq!(bruno.program, Some(Program::Cronico));
    assert_eq!(bruno.admission_date, date("2023-12-01"));
    assert!(bruno.has_therapy(Therapy::Antibiotic));
    assert!(!bruno.has_therapy(Therapy::CuracionMayor));
    let treatment = bruno.antibiotic.as_ref().expect("có kháng sinh");
    assert_eq!(treatment.dose_mg, 1000.0);
    assert_eq!(treatment.frequency_hours, 8);

    let diego = roster.patients.iter().find(|p| p.id == "1004").expect("có 1004");
    assert_eq!(diego.program, Some(Program::CronicoPaliativo));
    assert_eq!(diego.status, PatientStatus::Pending);
    assert!(diego.coordinates.is_none());

    let elena = roster.patients.iter().find(|p| p.id == "1006").expect("có 1006");
    assert_eq!(elena.coordinates.map(|c| c.lat), Some(6.27));

    let gloria = roster.patients.iter().find(|p| p.id == "1008").expect("có 1008");
    assert_eq!(gloria.program, None);
}

#[test]
fn broken_antibiotic_is_dropped_but_patient_kept() {
    let roster = parse_patients_str(&fixture("patients.json")).expect("JSON hợp lệ");
    let fabio = roster.patients.iter().find(|p| p.id == "1007").expect("có 1007");
    assert!(fabio.antibiotic.is_none());
    assert!(fabio.has_therapy(Therapy::Glucometria));
}

#[test]
fn malformed_records_are_reported() {
    let roster = parse_patients_str(
        r#"[{"id": "a", "fechaNacimiento": "1990-01-01", "fechaIngreso": "2024-01-01"}, 42, {"fechaIngreso": "2024-01-01"}]"#,
    )
    .expect("JSON hợp lệ");
    assert_eq!(roster.patients.len(), 1);
    assert_eq!(roster.patients[0].status, PatientStatus::Pending);
    assert_eq!(roster.skipped.len(), 2);
    assert_eq!(roster.skipped[0].index, 1);
    assert_eq!(roster.skipped[0].reason, "record is not an object");
    assert_eq!(roster.skipped[1].id, None);
}

#[test]
fn wrapped_roster_is_accepted() {
    let roster = parse_staff_str(r#"{"users": [{"documento": "1", "cargo": "NUTRICIONISTA"}]}"#)
        .expect("JSON hợp lệ");
    assert_eq!(roster.staff[0].role, Role::Nutricionista);
}

#[test]
fn non_array_roster_is_rejected() {
    assert!(matches!(
        parse_patients_str(r#"{"id": "1"}"#),
        Err(SchedulingError::MissingData(_))
    ));
    assert!(matches!(
        parse_patients_str("not json"),
        Err(SchedulingError::Parse(_))
    ));
}

#[test]
fn staff_roles_and_shifts() {
    let roster = parse_staff_str(&fixture("staff.json")).expect("JSON hợp lệ");

    let ids: Vec<&str> = roster.staff.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["52000111", "80111222", "1020304", "33444555"]);

    assert_eq!(roster.staff[0].role, Role::AuxiliarEnfermeria);
    assert_eq!(roster.staff[0].shift_start, NaiveTime::from_hms_opt(7, 0, 0));
    assert_eq!(roster.staff[1].max_patients, 8);
    assert_eq!(roster.staff[2].role, Role::JefeMedico);
    assert_eq!(roster.staff[2].max_patients, 0);
    assert_eq!(roster.staff[3].shift_duration_minutes(), 480);

    assert_eq!(roster.skipped.len(), 1);
    assert_eq!(roster.skipped[0].index, 4);
    assert_eq!(roster.skipped[0].reason, "unrecognized cargo CONDUCTOR");
}

#[test]
fn assistant_route_puts_antibiotics_first() {
    let request = RouteRequest {
        date: "2024-01-10".to_string(),
        role: "AUXILIAR DE ENFERMERIA PAD".to_string(),
        staff_id: "52000111".to_string(),
    };
    let report = plan_route_str(
        &fixture("patients.json"),
        &fixture("staff.json"),
        &request,
        &SchedulingConfig::default(),
    )
    .expect("tạo được tuyến");

    let route = report.route;
    let ids: Vec<&str> = route.stops.iter().map(|s| s.patient_id.as_str()).collect();
    assert_eq!(ids, vec!["1002", "1009"]);
    assert!(route.stops[0].antibiotic_priority);
    assert_eq!(route.stops[0].dose_schedule.as_deref(), Some("Cada 8h"));
    assert!(!route.stops[1].antibiotic_priority);
    assert_eq!(route.capacity, 6);
    assert_eq!(route.shift_minutes, 480);
    assert_eq!(route.time_load_percent, 25.0);
    assert!(route.distance_km > 0.0);
    assert_eq!(report.skipped_patients.len(), 1);
    assert_eq!(report.skipped_staff.len(), 1);
}

#[test]
fn physician_route_sorted_north_to_south() {
    let request = RouteRequest {
        date: "2024-01-10".to_string(),
        role: "MEDICO DOMICILIARIO".to_string(),
        staff_id: "80111222".to_string(),
    };
    let report = plan_route_str(
        &fixture("patients.json"),
        &fixture("staff.json"),
        &request,
        &SchedulingConfig::default(),
    )
    .expect("tạo được tuyến");

    let ids: Vec<&str> = report.route.stops.iter().map(|s| s.patient_id.as_str()).collect();
    assert_eq!(ids, vec!["1001", "1003"]);
    assert_eq!(report.route.staff_name, "Carlos Mejía");
    assert_eq!(report.route.capacity, 8);
}

#[test]
fn route_request_errors() {
    let config = SchedulingConfig::default();
    let patients = fixture("patients.json");
    let staff = fixture("staff.json");

    let bad_date = RouteRequest {
        date: "10/01/2024".to_string(),
        role: "MEDICO DOMICILIARIO".to_string(),
        staff_id: "80111222".to_string(),
    };
    assert!(matches!(
        plan_route_str(&patients, &staff, &bad_date, &config),
        Err(SchedulingError::Parse(_))
    ));

    let unknown = RouteRequest {
        date: "2024-01-10".to_string(),
        role: "MEDICO DOMICILIARIO".to_string(),
        staff_id: "nobody".to_string(),
    };
    assert_eq!(
        plan_route_str(&patients, &staff, &unknown, &config),
        Err(SchedulingError::UnknownStaff("nobody".to_string()))
    );
}

#[test]
fn date_formats() {
    assert_eq!(parse_date("2024-02-29"), Some(date("2024-02-29")));
    assert_eq!(parse_date("2024-02-29T23:30:00-05:00"), Some(date("2024-02-29")));
    assert_eq!(parse_date("2024-02-29T08:15:00"), Some(date("2024-02-29")));
    assert_eq!(parse_date("2024-02-30"), None);
    assert_eq!(parse_date(""), None);
}

#[test]
fn staffing_from_json() {
    let report = estimate_staffing_str(
        r#"{ "census": 190, "productive_hours": 6.5 }"#,
        &SchedulingConfig::default(),
    )
    .expect("đầu vào hợp lệ");
    assert_eq!(report.census, 190);
    assert_eq!(report.triggers[0].status, TriggerStatus::Critico);

    assert_eq!(
        estimate_staffing_str(r#"{ "productive_hours": 0 }"#, &SchedulingConfig::default()),
        Err(SchedulingError::InvalidProductiveMinutes(0.0))
    );
}

#[test]
fn json_store_feeds_refresh() {
    let store = JsonRosterStore::from_strs(&fixture("patients.json"), &fixture("staff.json"))
        .expect("JSON hợp lệ");
    let guard = RefreshGuard::new();

    let patients = refresh_patients(&store, &guard)
        .expect("kho không lỗi")
        .expect("không bị chặn");
    assert_eq!(patients.len(), 8);
    assert_eq!(store.load_staff().expect("kho không lỗi").len(), 4);
    assert!(!guard.is_refreshing());
}

const SERVICE_ROLES: [(&str, &str); 21] = [
    ("ATENCION (VISITA) DOMICILIARIA, POR TRABAJO SOCIAL", "TRABAJADOR (A) SOCIAL DOMICILIARIO"),
    ("ATENCION (VISITA) DOMICILIARIA, POR MEDICINA GENERAL", "MEDICO DOMICILIARIO"),
    ("CAMBIO CATETER URINARIO EN DOMICILIO", "AUXILIAR DE ENFERMERIA PAD"),
    ("ATENCION (VISITA) DOMICILIARIA, POR NUTRICION Y DIETETICA", "NUTRICIONISTA"),
    ("CURACION MAYOR EN CASA POR ENFERMERIA", "AUXILIAR DE ENFERMERIA PAD (N)"),
    ("ATENCION (VISITA) DOMICILIARIA, POR FONIATRIA Y FONOAUDIOLOGIA", "FONOAUDIOLOGO (A) PAD"),
    ("ATENCION (VISITA) DOMICILIARIA, POR FISIOTERAPIA", "FISIOTERAPEUTA PAD"),
    ("ATENCION (VISITA) DOMICILIARIA, POR TERAPIA OCUPACIONAL", "TERAPEUTA OCUPACIONAL PAD"),
    ("ATENCION (VISITA) DOMICILIARIA, POR TERAPIA RESPIRATORIA", "FISIOTERAPEUTA PAD"),
    ("ATENCION MEDICA DOMICILIARIA CONDUCTA INTERNA", "MEDICO DOMICILIARIO"),
    ("TOMA DE MUESTRA EN DOMICILIO", "AUXILIAR DE ENFERMERIA PAD"),
    ("APLICACION MEDICAMENTO (1 DOSIS DIA)", "AUXILIAR DE ENFERMERIA PAD"),
    ("APLICACION MEDICAMENTO DOS DOSIS DIA DOMICILIARIO", "AUXILIAR DE ENFERMERIA PAD"),
    ("APLICACION MEDICAMENTO TRES DOSIS DIA DOMICILIARIO", "AUXILIAR DE ENFERMERIA PAD (N)"),
    ("CONSULTA DE INGRESO AL PROGRAMA DOMICILIARIO", "MEDICO DOMICILIARIO"),
    ("ATENCION MEDICA DOMICILIARIA CUIDADOS PALIATIVOS", "MEDICO DOMICILIARIO"),
    (
        "ATENCION VISITA DOMICILIARIA CUIDADOS PALIATIVOS POR TRABAJO SOCIAL",
        "TRABAJADOR (A) SOCIAL DOMICILIARIO",
    ),
    (
        "ATENCION VISITA DOMICILIARIA CUIDADOS PALIATIVOS POR PSICOLOGIA",
        "PSICOLOGO (A) CLINICO",
    ),
    ("ATENCION MEDICA DOMICILIARIA CUIDADOS PALIATIVOS INGRESO", "MEDICO DOMICILIARIO"),
    ("ATENCION (VISITA) DOMICILIARIA, POR ENFERMERIA", "ENFERMERO(A) JEFE PAD ADMINISTRATIVO"),
    (
        "INYECCION O INFUSION DE OTRA SUSTANCIA TERAPEUTICA O PROFILACTICA (4 DOSIS DIA)",
        "AUXILIAR DE ENFERMERIA PAD",
    ),
];

#[test]
fn every_service_reaches_its_role() {
    for (service, cargo) in SERVICE_ROLES {
        let mut terapias = serde_json::Map::new();
        terapias.insert(service.to_string(), json!(true));
        let record = json!([{
            "id": "svc",
            "fechaNacimiento": "1950-01-01",
            "fechaIngreso": "2024-01-01",
            "terapias": terapias,
        }]);
        let roster = parse_patients_value(&record).expect("JSON hợp lệ");
        let therapies = &roster.patients[0].therapies;
        assert_eq!(therapies.len(), 1, "không nhận diện được dịch vụ {service}");

        let role = Role::from_label(cargo).expect("chức danh hợp lệ");
        assert!(serves_need(role, therapies), "{service} không tới {cargo}");
    }
}

#[test]
fn palliative_psychosocial_visits_skip_the_physician() {
    for (service, role) in [
        (
            "ATENCION VISITA DOMICILIARIA CUIDADOS PALIATIVOS POR TRABAJO SOCIAL",
            Role::TrabajadorSocial,
        ),
        (
            "ATENCION VISITA DOMICILIARIA CUIDADOS PALIATIVOS POR PSICOLOGIA",
            Role::Psicologo,
        ),
    ] {
        let therapy = Therapy::from_label(service).expect("dịch vụ hợp lệ");
        let needs = [therapy].into_iter().collect();
        assert!(serves_need(role, &needs));
        assert!(!serves_need(Role::MedicoDomiciliario, &needs));
    }
}

#[test]
fn route_request_role_must_match_staff() {
    let request = RouteRequest {
        date: "2024-01-10".to_string(),
        role: "FISIOTERAPEUTA PAD".to_string(),
        staff_id: "52000111".to_string(),
    };
    assert_eq!(
        plan_route_str(
            &fixture("patients.json"),
            &fixture("staff.json"),
            &request,
            &SchedulingConfig::default(),
        ),
        Err(SchedulingError::StaffNotEligible("52000111".to_string()))
    );
}

#[test]
fn excluded_staff_are_refused_a_route() {
    let request = RouteRequest {
        date: "2024-01-10".to_string(),
        role: "AUXILIAR DE ENFERMERIA PAD".to_string(),
        staff_id: "52000111".to_string(),
    };
    let config = SchedulingConfig {
        excluded_staff_names: vec!["LAURA PEREZ".to_string()],
        ..SchedulingConfig::default()
    };
    assert_eq!(
        plan_route_str(&fixture("patients.json"), &fixture("staff.json"), &request, &config),
        Err(SchedulingError::StaffNotEligible("52000111".to_string()))
    );
}
