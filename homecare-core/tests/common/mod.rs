#![allow(dead_code)]

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use homecare_core::{
    AntibioticTreatment, Coordinates, Patient, PatientStatus, Program, Role, StaffMember, Therapy,
};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("ngày mẫu không hợp lệ")
}

pub fn patient(id: &str, program: Program, admission: &str) -> Patient {
    Patient {
        id: id.to_string(),
        name: format!("Paciente {id}"),
        program: Some(program),
        birth_date: date("1950-06-15"),
        admission_date: date(admission),
        therapies: BTreeSet::from([Therapy::MedicinaGeneral]),
        antibiotic: None,
        status: PatientStatus::Accepted,
        coordinates: None,
        address: None,
    }
}

pub fn with_therapies(mut patient: Patient, therapies: &[Therapy]) -> Patient {
    patient.therapies = therapies.iter().copied().collect();
    patient
}

pub fn with_antibiotic(mut patient: Patient, start: &str, end: &str) -> Patient {
    patient.therapies.insert(Therapy::Antibiotic);
    patient.antibiotic = Some(AntibioticTreatment {
        drug_name: "Meropenem".to_string(),
        start_date: date(start),
        end_date: date(end),
        dose_mg: 1000.0,
        frequency_hours: 8,
    });
    patient
}

pub fn at(mut patient: Patient, lat: f64, lng: f64) -> Patient {
    patient.coordinates = Some(Coordinates { lat, lng });
    patient
}

pub fn staff(id: &str, role: Role) -> StaffMember {
    StaffMember {
        id: id.to_string(),
        name: format!("Colaborador {id}"),
        role,
        shift_start: NaiveTime::from_hms_opt(7, 0, 0),
        shift_end: NaiveTime::from_hms_opt(15, 0, 0),
        max_patients: 0,
    }
}
