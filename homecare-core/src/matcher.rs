//! Ghép vai trò nhân viên với nhu cầu liệu pháp của bệnh nhân.

use std::collections::BTreeSet;

use crate::{Role, Therapy};

impl Role {
    /// Các nhóm dịch vụ mà vai trò này được phép thực hiện.
    pub fn capabilities(self) -> &'static [Therapy] {
        match self {
            Role::MedicoDomiciliario => &[
                Therapy::MedicinaGeneral,
                Therapy::ConsultaIngreso,
                Therapy::JuntaMedica,
                Therapy::CuidadoPaliativo,
            ],
            Role::AuxiliarEnfermeria => &[
                Therapy::Antibiotic,
                Therapy::CuracionMayor,
                Therapy::CambioCateter,
                Therapy::ManejoSondas,
                Therapy::Glucometria,
                Therapy::TomaMuestra,
            ],
            Role::EnfermeroJefe | Role::EnfermeroJefeAdministrativo => &[Therapy::Enfermeria],
            Role::Fisioterapeuta => &[Therapy::Fisioterapia, Therapy::TerapiaRespiratoria],
            Role::Fonoaudiologo => &[Therapy::Fonoaudiologia],
            Role::TerapeutaOcupacional => &[Therapy::TerapiaOcupacional],
            Role::Nutricionista => &[Therapy::Nutricion],
            Role::Psicologo => &[Therapy::Psicologia],
            Role::TrabajadorSocial => &[Therapy::TrabajoSocial],
            Role::JefeMedico
            | Role::CoordinadorOperativo
            | Role::Administrativo
            | Role::Aprendiz => &[],
        }
    }
}

/// Khớp khi giao giữa liệu pháp đang hoạt động và năng lực vai trò khác rỗng.
/// Điều dưỡng phụ luôn nhận bệnh nhân có cờ kháng sinh (tiêm nhiều lần/ngày).
pub fn serves_need(role: Role, therapies: &BTreeSet<Therapy>) -> bool {
    if role.is_nursing_assistant() && therapies.contains(&Therapy::Antibiotic) {
        return true;
    }
    role.capabilities()
        .iter()
        .any(|therapy| therapies.contains(therapy))
}
