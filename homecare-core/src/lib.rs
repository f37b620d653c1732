//! Logic lõi lập lịch thăm khám tại nhà: chu kỳ thăm, ghép nhân viên, tuyến và định biên.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub mod agenda;
pub mod capacity;
pub mod due;
pub mod matcher;
pub mod recurrence;
pub mod route;
pub mod store;

pub use agenda::{upcoming_agenda, Appointment};
pub use capacity::{
    capacity_report, estimate_fte, CapacityReport, FteEstimate, GrowthTrigger, StaffingRequest,
    StandardTimes, TriggerStatus, VisitDistribution,
};
pub use due::{days_since_admission, is_due, next_due_on_or_after};
pub use matcher::serves_need;
pub use recurrence::{age_in_years, resolve_interval, DueReason, VisitInterval};
pub use route::{
    available_staff, compute_route, EditOutcome, MoveDirection, RouteEvent, RoutePlanner,
    RouteSelection, RouteState, RouteStop, RouteSummary, SavedRoute,
};
pub use store::{
    poll_patients, refresh_patients, MemoryStore, PatientStore, RefreshGuard, RefreshTicket,
    RouteStore, StaffStore,
};

/// Cấu hình các chu kỳ thăm và ngưỡng vận hành.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Chu kỳ (ngày) cho chương trình Hospitalario.
    pub hospitalario_interval_days: u32,
    /// Chu kỳ (ngày) cho chương trình Crónico.
    pub cronico_interval_days: u32,
    /// Chu kỳ (ngày) cho chương trình Crónico Paliativo.
    pub paliativo_interval_days: u32,
    /// Dưới độ tuổi này bệnh nhân được thăm hằng ngày.
    pub pediatric_age_years: u32,
    /// Sức chứa mặc định khi nhân viên chưa khai báo `max_patients`.
    pub default_max_patients: u32,
    /// Thời lượng ước tính cố định cho mỗi lượt thăm (phút).
    pub minutes_per_visit: u32,
    pub search_result_limit: usize,
    /// Tên nhân viên không bao giờ được xếp tuyến.
    pub excluded_staff_names: Vec<String>,
    /// Chu kỳ làm mới danh sách bệnh nhân (giây).
    pub roster_refresh_secs: u64,
    /// Sức chứa tổng của chương trình, dùng cho cảnh báo tăng trưởng.
    pub census_capacity: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            hospitalario_interval_days: 3,
            cronico_interval_days: 90,
            paliativo_interval_days: 7,
            pediatric_age_years: 5,
            default_max_patients: 6,
            minutes_per_visit: 60,
            search_result_limit: 5,
            excluded_staff_names: Vec::new(),
            roster_refresh_secs: 30,
            census_capacity: 200,
        }
    }
}

/// Chương trình chăm sóc mà bệnh nhân đăng ký.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    Hospitalario,
    Cronico,
    CronicoPaliativo,
}

impl Program {
    /// Nhận diện chương trình từ chuỗi lưu trữ (không phân biệt hoa thường, dấu).
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        if normalized.contains("paliativ") {
            Some(Program::CronicoPaliativo)
        } else if normalized.contains("cronico") {
            Some(Program::Cronico)
        } else if normalized.contains("hospitalario") {
            Some(Program::Hospitalario)
        } else {
            None
        }
    }

    pub fn visit_label(self) -> &'static str {
        match self {
            Program::Hospitalario => "Visita Domiciliaria (Hospitalario)",
            Program::Cronico => "Visita Domiciliaria (Crónico)",
            Program::CronicoPaliativo => "Visita Domiciliaria (Paliativo)",
        }
    }
}

/// Nhóm liệu pháp/dịch vụ mà một vai trò có thể thực hiện.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Therapy {
    Antibiotic,
    MedicinaGeneral,
    ConsultaIngreso,
    CuidadoPaliativo,
    JuntaMedica,
    CuracionMayor,
    CambioCateter,
    ManejoSondas,
    Glucometria,
    TomaMuestra,
    Oxigeno,
    Oximetria,
    TerapiaRespiratoria,
    Fisioterapia,
    TerapiaOcupacional,
    Fonoaudiologia,
    Nutricion,
    TrabajoSocial,
    Psicologia,
    Enfermeria,
    OtrasTerapias,
}

/// Thứ tự quan trọng: chuỗi cụ thể hơn phải đứng trước.
/// Dịch vụ paliativo do trabajo social/psicología thực hiện thuộc về nghề đó.
const THERAPY_KEYWORDS: [(&str, Therapy); 24] = [
    ("antibiotic", Therapy::Antibiotic),
    ("aplicacion medicamento", Therapy::Antibiotic),
    ("inyeccion o infusion", Therapy::Antibiotic),
    ("trabajo social", Therapy::TrabajoSocial),
    ("psicologia", Therapy::Psicologia),
    ("cuidados paliativos", Therapy::CuidadoPaliativo),
    ("terapia respiratoria", Therapy::TerapiaRespiratoria),
    ("terapia ocupacional", Therapy::TerapiaOcupacional),
    ("fonoaudiologia", Therapy::Fonoaudiologia),
    ("fisioterapia", Therapy::Fisioterapia),
    ("nutricion", Therapy::Nutricion),
    ("medicina general", Therapy::MedicinaGeneral),
    ("conducta interna", Therapy::MedicinaGeneral),
    ("consulta de ingreso", Therapy::ConsultaIngreso),
    ("junta", Therapy::JuntaMedica),
    ("curacion", Therapy::CuracionMayor),
    ("cateter", Therapy::CambioCateter),
    ("sonda", Therapy::ManejoSondas),
    ("glucometr", Therapy::Glucometria),
    ("muestra", Therapy::TomaMuestra),
    ("oximetria", Therapy::Oximetria),
    ("oxigeno", Therapy::Oxigeno),
    ("por enfermeria", Therapy::Enfermeria),
    ("otras terapias", Therapy::OtrasTerapias),
];

impl Therapy {
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        THERAPY_KEYWORDS
            .iter()
            .find(|(keyword, _)| normalized.contains(keyword))
            .map(|(_, therapy)| *therapy)
    }
}

/// Vai trò nhân viên, phân giải một lần khi nạp dữ liệu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    MedicoDomiciliario,
    JefeMedico,
    EnfermeroJefe,
    EnfermeroJefeAdministrativo,
    CoordinadorOperativo,
    AuxiliarEnfermeria,
    Fisioterapeuta,
    Fonoaudiologo,
    TerapeutaOcupacional,
    Nutricionista,
    Psicologo,
    TrabajadorSocial,
    Administrativo,
    Aprendiz,
}

impl Role {
    /// Nhận diện vai trò từ chức danh (`cargo`) lưu trữ.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = normalize_label(label);
        let has = |needle: &str| normalized.contains(needle);

        let role = if has("jefe medico") {
            Role::JefeMedico
        } else if has("coordinador") {
            Role::CoordinadorOperativo
        } else if has("jefe") && has("enfermer") {
            if has("administrativo") {
                Role::EnfermeroJefeAdministrativo
            } else {
                Role::EnfermeroJefe
            }
        } else if has("auxiliar de enfermeria") {
            Role::AuxiliarEnfermeria
        } else if has("aprendiz") {
            Role::Aprendiz
        } else if has("administrativo") || has("servicio al cliente") {
            Role::Administrativo
        } else if has("fisioterapeuta") {
            Role::Fisioterapeuta
        } else if has("fonoaudiolog") {
            Role::Fonoaudiologo
        } else if has("ocupacional") {
            Role::TerapeutaOcupacional
        } else if has("nutricion") {
            Role::Nutricionista
        } else if has("psicolog") {
            Role::Psicologo
        } else if has("trabajador") {
            Role::TrabajadorSocial
        } else if has("medico") {
            Role::MedicoDomiciliario
        } else {
            return None;
        };
        Some(role)
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::MedicoDomiciliario => "MEDICO DOMICILIARIO",
            Role::JefeMedico => "JEFE MEDICO",
            Role::EnfermeroJefe => "ENFERMERO(A) JEFE PAD",
            Role::EnfermeroJefeAdministrativo => "ENFERMERO(A) JEFE PAD ADMINISTRATIVO",
            Role::CoordinadorOperativo => "COORDINADOR (A) OPERATIVO(A) PAD",
            Role::AuxiliarEnfermeria => "AUXILIAR DE ENFERMERIA PAD",
            Role::Fisioterapeuta => "FISIOTERAPEUTA PAD",
            Role::Fonoaudiologo => "FONOAUDIOLOGO (A) PAD",
            Role::TerapeutaOcupacional => "TERAPEUTA OCUPACIONAL PAD",
            Role::Nutricionista => "NUTRICIONISTA",
            Role::Psicologo => "PSICOLOGO (A) CLINICO",
            Role::TrabajadorSocial => "TRABAJADOR (A) SOCIAL DOMICILIARIO",
            Role::Administrativo => "AUXILIAR ADMINISTRATIVO PAD",
            Role::Aprendiz => "APRENDIZ EN ETAPA PRACTICA",
        }
    }

    /// Vai trò điều phối được phép chỉnh sửa tuyến thủ công.
    pub fn is_coordinator(self) -> bool {
        matches!(
            self,
            Role::JefeMedico
                | Role::EnfermeroJefe
                | Role::EnfermeroJefeAdministrativo
                | Role::CoordinadorOperativo
        )
    }

    pub fn is_nursing_assistant(self) -> bool {
        self == Role::AuxiliarEnfermeria
    }
}

/// Trạng thái tiếp nhận bệnh nhân.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Pending,
    Accepted,
    Rejected,
}

/// Mức ưu tiên lượt thăm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Khoảng cách đường tròn lớn (km).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Đợt kháng sinh đang điều trị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AntibioticTreatment {
    pub drug_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dose_mg: f64,
    pub frequency_hours: u32,
}

impl AntibioticTreatment {
    /// So sánh theo ngày, hai đầu bao gồm.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn dose_schedule(&self) -> Option<String> {
        (self.frequency_hours > 0).then(|| format!("Cada {}h", self.frequency_hours))
    }
}

/// Bệnh nhân đã được chuẩn hóa, chỉ đọc đối với logic lập lịch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub program: Option<Program>,
    pub birth_date: NaiveDate,
    pub admission_date: NaiveDate,
    pub therapies: BTreeSet<Therapy>,
    pub antibiotic: Option<AntibioticTreatment>,
    pub status: PatientStatus,
    pub coordinates: Option<Coordinates>,
    pub address: Option<String>,
}

impl Patient {
    pub fn is_schedulable(&self) -> bool {
        self.status == PatientStatus::Accepted
    }

    pub fn has_therapy(&self, therapy: Therapy) -> bool {
        self.therapies.contains(&therapy)
    }

    /// Có cờ kháng sinh và đợt điều trị bao phủ `date`.
    pub fn antibiotic_active_on(&self, date: NaiveDate) -> bool {
        self.has_therapy(Therapy::Antibiotic)
            && self
                .antibiotic
                .as_ref()
                .is_some_and(|treatment| treatment.covers(date))
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.map(|c| c.lat).unwrap_or(0.0)
    }
}

/// Nhân viên thực hiện lượt thăm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub shift_start: Option<NaiveTime>,
    pub shift_end: Option<NaiveTime>,
    /// 0 nghĩa là chưa khai báo.
    pub max_patients: u32,
}

impl StaffMember {
    /// Độ dài ca (phút), vượt nửa đêm khi giờ kết thúc nhỏ hơn giờ bắt đầu.
    pub fn shift_duration_minutes(&self) -> u32 {
        let (Some(start), Some(end)) = (self.shift_start, self.shift_end) else {
            return 0;
        };
        let start = start.num_seconds_from_midnight() / 60;
        let mut end = end.num_seconds_from_midnight() / 60;
        if end < start {
            end += 24 * 60;
        }
        end - start
    }

    pub fn capacity(&self, config: &SchedulingConfig) -> u32 {
        if self.max_patients == 0 {
            config.default_max_patients
        } else {
            self.max_patients
        }
    }
}

/// Lỗi chung của logic lập lịch.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SchedulingError {
    #[error("Dữ liệu đầu vào thiếu thông tin tối thiểu: {0}")]
    MissingData(String),
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Số phút làm việc hiệu dụng phải lớn hơn 0 (nhận {0})")]
    InvalidProductiveMinutes(f64),
    #[error("Giá trị không hợp lệ cho {0}")]
    InvalidInput(String),
    #[error("Không tìm thấy nhân viên {0}")]
    UnknownStaff(String),
    #[error("Nhân viên {0} không thuộc vai trò đã chọn hoặc bị loại khỏi tuyến")]
    StaffNotEligible(String),
    #[error("Đã đạt giới hạn {max} bệnh nhân cho tuyến")]
    CapacityReached { max: u32 },
    #[error("Lỗi kho dữ liệu: {0}")]
    Store(String),
}

/// Chuẩn hóa nhãn tiếng Tây Ban Nha: chữ thường, bỏ dấu, gộp khoảng trắng.
pub fn normalize_label(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
