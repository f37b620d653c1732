//! Giao diện kho dữ liệu cho danh sách bệnh nhân, nhân viên và tuyến đã lưu.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{Patient, SavedRoute, SchedulingConfig, SchedulingError, StaffMember};

pub trait PatientStore {
    fn load_patients(&self) -> Result<Vec<Patient>, SchedulingError>;
}

pub trait StaffStore {
    fn load_staff(&self) -> Result<Vec<StaffMember>, SchedulingError>;
}

/// Ghi sau thắng: lưu lại cùng (ngày, nhân viên) sẽ ghi đè.
pub trait RouteStore {
    fn save_route(&mut self, route: SavedRoute) -> Result<(), SchedulingError>;
    fn load_route(&self, date: NaiveDate, staff_id: &str) -> Option<SavedRoute>;
}

/// Kho trong bộ nhớ (dùng cho CLI, test).
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    patients: Vec<Patient>,
    staff: Vec<StaffMember>,
    routes: HashMap<(NaiveDate, String), SavedRoute>,
}

impl MemoryStore {
    pub fn new(patients: Vec<Patient>, staff: Vec<StaffMember>) -> Self {
        Self {
            patients,
            staff,
            routes: HashMap::new(),
        }
    }

    pub fn replace_patients(&mut self, patients: Vec<Patient>) {
        self.patients = patients;
    }
}

impl PatientStore for MemoryStore {
    fn load_patients(&self) -> Result<Vec<Patient>, SchedulingError> {
        Ok(self.patients.clone())
    }
}

impl StaffStore for MemoryStore {
    fn load_staff(&self) -> Result<Vec<StaffMember>, SchedulingError> {
        Ok(self.staff.clone())
    }
}

impl RouteStore for MemoryStore {
    fn save_route(&mut self, route: SavedRoute) -> Result<(), SchedulingError> {
        let key = (route.date, route.staff_id.clone());
        if self.routes.insert(key, route).is_some() {
            tracing::debug!("overwrote previously saved route");
        }
        Ok(())
    }

    fn load_route(&self, date: NaiveDate, staff_id: &str) -> Option<SavedRoute> {
        self.routes.get(&(date, staff_id.to_string())).cloned()
    }
}

/// Ngăn hai lần làm mới danh sách chạy chồng nhau.
#[derive(Debug, Default)]
pub struct RefreshGuard {
    in_flight: AtomicBool,
}

/// Giữ cờ "đang làm mới" cho tới khi bị drop.
#[derive(Debug)]
pub struct RefreshTicket<'a> {
    guard: &'a RefreshGuard,
}

impl RefreshGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` nếu đã có lần làm mới khác đang chạy.
    pub fn try_begin(&self) -> Option<RefreshTicket<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshTicket { guard: self })
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

impl Drop for RefreshTicket<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

/// Làm mới danh sách bệnh nhân; trả `Ok(None)` khi bỏ qua vì đang có lần khác chạy.
pub fn refresh_patients<S: PatientStore + ?Sized>(
    store: &S,
    guard: &RefreshGuard,
) -> Result<Option<Vec<Patient>>, SchedulingError> {
    let Some(_ticket) = guard.try_begin() else {
        tracing::debug!("roster refresh already in flight, skipping");
        return Ok(None);
    };
    let patients = store.load_patients()?;
    tracing::debug!(patients = patients.len(), "roster refreshed");
    Ok(Some(patients))
}

/// Làm mới theo chu kỳ `roster_refresh_secs`; `Ok(None)` khi chưa tới hạn hoặc đang chạy.
pub fn poll_patients<S: PatientStore + ?Sized>(
    store: &S,
    guard: &RefreshGuard,
    config: &SchedulingConfig,
    last_refresh: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Option<Vec<Patient>>, SchedulingError> {
    if let Some(last) = last_refresh {
        let secs = i64::try_from(config.roster_refresh_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1_000);
        if now.signed_duration_since(last) < Duration::seconds(secs) {
            return Ok(None);
        }
    }
    refresh_patients(store, guard)
}
