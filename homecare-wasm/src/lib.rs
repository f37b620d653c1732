//! Bridge WASM <-> JavaScript cho màn hình tuyến, lịch thăm và định biên.

use homecare_core::{SchedulingConfig, SchedulingError, StaffingRequest};
use homecare_roster::RouteRequest;
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsSchedulingConfig {
    #[serde(default)]
    hospitalario_interval_days: Option<u32>,
    #[serde(default)]
    cronico_interval_days: Option<u32>,
    #[serde(default)]
    paliativo_interval_days: Option<u32>,
    #[serde(default)]
    pediatric_age_years: Option<u32>,
    #[serde(default)]
    default_max_patients: Option<u32>,
    #[serde(default)]
    minutes_per_visit: Option<u32>,
    #[serde(default)]
    excluded_staff_names: Option<Vec<String>>,
    #[serde(default)]
    census_capacity: Option<u32>,
}

impl From<JsSchedulingConfig> for SchedulingConfig {
    fn from(cfg: JsSchedulingConfig) -> Self {
        let mut base = SchedulingConfig::default();
        if let Some(days) = cfg.hospitalario_interval_days {
            base.hospitalario_interval_days = days;
        }
        if let Some(days) = cfg.cronico_interval_days {
            base.cronico_interval_days = days;
        }
        if let Some(days) = cfg.paliativo_interval_days {
            base.paliativo_interval_days = days;
        }
        if let Some(years) = cfg.pediatric_age_years {
            base.pediatric_age_years = years;
        }
        if let Some(max) = cfg.default_max_patients {
            base.default_max_patients = max;
        }
        if let Some(minutes) = cfg.minutes_per_visit {
            base.minutes_per_visit = minutes;
        }
        if let Some(names) = cfg.excluded_staff_names {
            base.excluded_staff_names = names;
        }
        if let Some(capacity) = cfg.census_capacity {
            base.census_capacity = capacity;
        }
        base
    }
}

/// Tuyến tính toán cho một nhân viên; `request` là `{ date, role, staff_id }`.
#[wasm_bindgen]
pub fn plan_route(
    patients: JsValue,
    staff: JsValue,
    request: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let patients_value = from_value::<serde_json::Value>(patients)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách bệnh nhân: {err}")))?;
    let staff_value = from_value::<serde_json::Value>(staff)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách nhân viên: {err}")))?;
    let request: RouteRequest = from_value(request)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được yêu cầu tuyến: {err}")))?;
    let cfg = read_config(config)?;

    let report = homecare_roster::plan_route_value(&patients_value, &staff_value, &request, &cfg)
        .map_err(|err| JsValue::from_str(&format_scheduling_error(err)))?;

    to_value(&report).map_err(|err| JsValue::from_str(&format!("Không serialize tuyến: {err}")))
}

#[wasm_bindgen]
pub fn upcoming_agenda(
    patients: JsValue,
    date: &str,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let patients_value = from_value::<serde_json::Value>(patients)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách bệnh nhân: {err}")))?;
    let cfg = read_config(config)?;

    let report = homecare_roster::agenda_value(&patients_value, date, &cfg)
        .map_err(|err| JsValue::from_str(&format_scheduling_error(err)))?;

    to_value(&report)
        .map_err(|err| JsValue::from_str(&format!("Không serialize lịch thăm: {err}")))
}

#[wasm_bindgen]
pub fn estimate_staffing(request: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let request: StaffingRequest = from_value(request)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được đầu vào định biên: {err}")))?;
    let cfg = read_config(config)?;

    let report = homecare_core::capacity_report(&request, &cfg)
        .map_err(|err| JsValue::from_str(&format_scheduling_error(err)))?;

    to_value(&report)
        .map_err(|err| JsValue::from_str(&format!("Không serialize báo cáo định biên: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<SchedulingConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsSchedulingConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            Ok(SchedulingConfig::from(cfg))
        }
        _ => Ok(SchedulingConfig::default()),
    }
}

fn format_scheduling_error(err: SchedulingError) -> String {
    format!("Scheduling error: {err}")
}
