//! Application roster JSON to the typed scheduling model, with string-level entry points.
//!
//! Records are read in the shape the PWA stores them (`fechaIngreso`, `terapias`,
//! `cargo`, ...). Program, role and therapy names are resolved once here; the core
//! never sees raw strings. A malformed record is skipped and reported, it never
//! aborts the batch.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use homecare_core::{
    capacity_report, upcoming_agenda, AntibioticTreatment, Appointment, CapacityReport,
    Coordinates, Patient, PatientStatus, PatientStore, Program, Role, RoutePlanner,
    RouteSelection, RouteSummary, SchedulingConfig, SchedulingError, StaffMember, StaffStore,
    StaffingRequest, Therapy,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record left out of the roster and why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedRecord {
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PatientRoster {
    pub patients: Vec<Patient>,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StaffRoster {
    pub staff: Vec<StaffMember>,
    pub skipped: Vec<SkippedRecord>,
}

/// Parse a patient roster from a JSON string.
pub fn parse_patients_str(json: &str) -> Result<PatientRoster, SchedulingError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| SchedulingError::Parse(err.to_string()))?;
    parse_patients_value(&value)
}

/// Parse a patient roster from a `serde_json::Value` array.
pub fn parse_patients_value(value: &Value) -> Result<PatientRoster, SchedulingError> {
    let entries = roster_entries(value, "patients")?;
    let mut roster = PatientRoster::default();

    for (index, entry) in entries.iter().enumerate() {
        match extract_patient(entry) {
            Ok(patient) => roster.patients.push(patient),
            Err(reason) => {
                let id = record_id(entry, "id");
                tracing::warn!(index, id = ?id, %reason, "skipping patient record");
                roster.skipped.push(SkippedRecord { index, id, reason });
            }
        }
    }

    Ok(roster)
}

/// Parse a staff roster from a JSON string.
pub fn parse_staff_str(json: &str) -> Result<StaffRoster, SchedulingError> {
    let value: Value =
        serde_json::from_str(json).map_err(|err| SchedulingError::Parse(err.to_string()))?;
    parse_staff_value(&value)
}

/// Parse a staff roster; patient-portal accounts are not staff and are dropped quietly.
pub fn parse_staff_value(value: &Value) -> Result<StaffRoster, SchedulingError> {
    let entries = roster_entries(value, "users")?;
    let mut roster = StaffRoster::default();

    for (index, entry) in entries.iter().enumerate() {
        if entry.get("tipoUsuario").and_then(Value::as_str) == Some("PACIENTE") {
            continue;
        }
        match extract_staff(entry) {
            Ok(member) => roster.staff.push(member),
            Err(reason) => {
                let id = record_id(entry, "documento");
                tracing::warn!(index, id = ?id, %reason, "skipping staff record");
                roster.skipped.push(SkippedRecord { index, id, reason });
            }
        }
    }

    Ok(roster)
}

/// Route selection as sent by the caller: ISO date, role title, staff document id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRequest {
    pub date: String,
    pub role: String,
    pub staff_id: String,
}

impl RouteRequest {
    pub fn selection(&self) -> Result<RouteSelection, SchedulingError> {
        let date = parse_date(&self.date)
            .ok_or_else(|| SchedulingError::Parse(format!("invalid date {}", self.date)))?;
        let role = Role::from_label(&self.role)
            .ok_or_else(|| SchedulingError::Parse(format!("unknown role {}", self.role)))?;
        Ok(RouteSelection {
            date,
            role,
            staff_id: self.staff_id.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteReport {
    pub route: RouteSummary,
    pub skipped_patients: Vec<SkippedRecord>,
    pub skipped_staff: Vec<SkippedRecord>,
}

/// Build the computed route for one staff member and date from raw JSON strings.
pub fn plan_route_str(
    patients_json: &str,
    staff_json: &str,
    request: &RouteRequest,
    config: &SchedulingConfig,
) -> Result<RouteReport, SchedulingError> {
    let patients: Value = serde_json::from_str(patients_json)
        .map_err(|err| SchedulingError::Parse(err.to_string()))?;
    let staff: Value =
        serde_json::from_str(staff_json).map_err(|err| SchedulingError::Parse(err.to_string()))?;
    plan_route_value(&patients, &staff, request, config)
}

pub fn plan_route_value(
    patients: &Value,
    staff: &Value,
    request: &RouteRequest,
    config: &SchedulingConfig,
) -> Result<RouteReport, SchedulingError> {
    let patient_roster = parse_patients_value(patients)?;
    let staff_roster = parse_staff_value(staff)?;
    let planner = RoutePlanner::new(
        request.selection()?,
        &staff_roster.staff,
        &patient_roster.patients,
        config,
    )?;

    Ok(RouteReport {
        route: planner.summary(),
        skipped_patients: patient_roster.skipped,
        skipped_staff: staff_roster.skipped,
    })
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgendaReport {
    pub generated_at: DateTime<Utc>,
    pub date: NaiveDate,
    pub appointments: Vec<Appointment>,
    pub skipped: Vec<SkippedRecord>,
}

/// Upcoming visit agenda from a JSON string.
pub fn agenda_str(
    patients_json: &str,
    date: &str,
    config: &SchedulingConfig,
) -> Result<AgendaReport, SchedulingError> {
    let value: Value = serde_json::from_str(patients_json)
        .map_err(|err| SchedulingError::Parse(err.to_string()))?;
    agenda_value(&value, date, config)
}

pub fn agenda_value(
    patients: &Value,
    date: &str,
    config: &SchedulingConfig,
) -> Result<AgendaReport, SchedulingError> {
    let today =
        parse_date(date).ok_or_else(|| SchedulingError::Parse(format!("invalid date {date}")))?;
    let roster = parse_patients_value(patients)?;

    Ok(AgendaReport {
        generated_at: Utc::now(),
        date: today,
        appointments: upcoming_agenda(&roster.patients, today, config),
        skipped: roster.skipped,
    })
}

/// Staffing estimate from a JSON `StaffingRequest`.
pub fn estimate_staffing_str(
    request_json: &str,
    config: &SchedulingConfig,
) -> Result<CapacityReport, SchedulingError> {
    let request: StaffingRequest =
        serde_json::from_str(request_json).map_err(|err| SchedulingError::Parse(err.to_string()))?;
    capacity_report(&request, config)
}

/// Stores backed by already-fetched roster JSON (e.g. the local cache).
#[derive(Debug, Clone)]
pub struct JsonRosterStore {
    patients: Value,
    staff: Value,
}

impl JsonRosterStore {
    pub fn new(patients: Value, staff: Value) -> Self {
        Self { patients, staff }
    }

    pub fn from_strs(patients_json: &str, staff_json: &str) -> Result<Self, SchedulingError> {
        let patients = serde_json::from_str(patients_json)
            .map_err(|err| SchedulingError::Parse(err.to_string()))?;
        let staff =
            serde_json::from_str(staff_json).map_err(|err| SchedulingError::Parse(err.to_string()))?;
        Ok(Self::new(patients, staff))
    }
}

impl PatientStore for JsonRosterStore {
    fn load_patients(&self) -> Result<Vec<Patient>, SchedulingError> {
        parse_patients_value(&self.patients).map(|roster| roster.patients)
    }
}

impl StaffStore for JsonRosterStore {
    fn load_staff(&self) -> Result<Vec<StaffMember>, SchedulingError> {
        parse_staff_value(&self.staff).map(|roster| roster.staff)
    }
}

/// Accept `YYYY-MM-DD`, RFC 3339 timestamps and naive ISO timestamps; keep the date part.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map(|dt| dt.date())
        .ok()
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

fn roster_entries<'a>(value: &'a Value, wrapper_key: &str) -> Result<&'a Vec<Value>, SchedulingError> {
    if let Some(entries) = value.as_array() {
        return Ok(entries);
    }
    match value.get(wrapper_key) {
        Some(inner) => inner.as_array().ok_or_else(|| {
            SchedulingError::Parse(format!("expected `{wrapper_key}` to be an array"))
        }),
        None => Err(SchedulingError::MissingData(format!(
            "expected a JSON array or an object with `{wrapper_key}`"
        ))),
    }
}

fn extract_patient(record: &Value) -> Result<Patient, String> {
    if !record.is_object() {
        return Err("record is not an object".to_string());
    }

    let id = string_field(record, "id").ok_or("missing id")?;
    let birth_date = date_field(record, "fechaNacimiento")
        .ok_or("missing or invalid fechaNacimiento")?;
    let admission_date =
        date_field(record, "fechaIngreso").ok_or("missing or invalid fechaIngreso")?;

    let program = string_field(record, "programa").and_then(|label| {
        let program = Program::from_label(&label);
        if program.is_none() {
            tracing::debug!(%id, programa = %label, "unknown program, patient will not be scheduled");
        }
        program
    });

    let therapies: BTreeSet<Therapy> = record
        .get("terapias")
        .and_then(Value::as_object)
        .map(|flags| {
            flags
                .iter()
                .filter(|(_, active)| active.as_bool().unwrap_or(false))
                .filter_map(|(name, _)| {
                    let therapy = Therapy::from_label(name);
                    if therapy.is_none() {
                        tracing::debug!(%id, therapy = %name, "unrecognized therapy flag");
                    }
                    therapy
                })
                .collect()
        })
        .unwrap_or_default();

    let antibiotic = record
        .get("antibiotico")
        .filter(|value| value.is_object())
        .and_then(|value| {
            let treatment = extract_antibiotic(value);
            if treatment.is_none() {
                tracing::warn!(%id, "ignoring antibiotic treatment with missing or invalid dates");
            }
            treatment
        });

    let status = match record.get("estado").and_then(Value::as_str) {
        Some("Aceptado") => PatientStatus::Accepted,
        Some("Rechazado") => PatientStatus::Rejected,
        _ => PatientStatus::Pending,
    };

    let coordinates = record.get("coordinates").and_then(|value| {
        Some(Coordinates {
            lat: number_field(value, "lat")?,
            lng: number_field(value, "lng")?,
        })
    });

    Ok(Patient {
        name: string_field(record, "nombreCompleto").unwrap_or_default(),
        id,
        program,
        birth_date,
        admission_date,
        therapies,
        antibiotic,
        status,
        coordinates,
        address: string_field(record, "direccion"),
    })
}

fn extract_antibiotic(value: &Value) -> Option<AntibioticTreatment> {
    Some(AntibioticTreatment {
        drug_name: string_field(value, "medicamento").unwrap_or_default(),
        start_date: date_field(value, "fechaInicio")?,
        end_date: date_field(value, "fechaTerminacion")?,
        dose_mg: number_field(value, "miligramos").unwrap_or(0.0),
        frequency_hours: number_field(value, "frecuenciaHoras")
            .filter(|hours| *hours > 0.0)
            .map(|hours| hours.round() as u32)
            .unwrap_or(0),
    })
}

fn extract_staff(record: &Value) -> Result<StaffMember, String> {
    if !record.is_object() {
        return Err("record is not an object".to_string());
    }

    let id = string_field(record, "documento").ok_or("missing documento")?;
    let cargo = string_field(record, "cargo").ok_or("missing cargo")?;
    let role = Role::from_label(&cargo).ok_or_else(|| format!("unrecognized cargo {cargo}"))?;

    let shift_start = time_field(record, "turnoInicio");
    let shift_end = time_field(record, "turnoFin");
    if shift_start.is_none() != shift_end.is_none() {
        tracing::debug!(%id, "incomplete shift, load percentage will read 0");
    }

    let max_patients = number_field(record, "maxPacientes")
        .filter(|max| *max > 0.0)
        .map(|max| max.floor() as u32)
        .unwrap_or(0);

    Ok(StaffMember {
        name: string_field(record, "nombre").unwrap_or_default(),
        id,
        role,
        shift_start,
        shift_end,
        max_patients,
    })
}

fn record_id(record: &Value, key: &str) -> Option<String> {
    string_field(record, key)
}

fn string_field(record: &Value, key: &str) -> Option<String> {
    let text = match record.get(key)? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn number_field(record: &Value, key: &str) -> Option<f64> {
    let number = match record.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|value| value.is_finite())
}

fn date_field(record: &Value, key: &str) -> Option<NaiveDate> {
    record.get(key).and_then(Value::as_str).and_then(parse_date)
}

fn time_field(record: &Value, key: &str) -> Option<NaiveTime> {
    record.get(key).and_then(Value::as_str).and_then(parse_time)
}
