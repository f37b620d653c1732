use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use homecare_core::{capacity_report, SchedulingConfig, StaffingRequest};
use homecare_roster::{agenda_str, estimate_staffing_str, plan_route_str, RouteRequest};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "homecare-cli",
    about = "Lập tuyến thăm, lịch thăm và định biên từ dữ liệu JSON."
)]
struct Args {
    /// File JSON cấu hình (thiếu trường nào dùng mặc định trường đó).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// In toàn bộ kết quả dạng JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tuyến tính toán của một nhân viên trong một ngày.
    Route {
        #[arg(long)]
        patients: PathBuf,
        #[arg(long)]
        staff: PathBuf,
        /// Ngày YYYY-MM-DD.
        #[arg(long)]
        date: String,
        /// Chức danh, ví dụ "AUXILIAR DE ENFERMERIA PAD".
        #[arg(long)]
        role: String,
        /// Số giấy tờ của nhân viên.
        #[arg(long)]
        staff_id: String,
    },
    /// Lượt thăm kế tiếp của mỗi bệnh nhân.
    Agenda {
        #[arg(long)]
        patients: PathBuf,
        #[arg(long)]
        date: String,
    },
    /// Ước tính ETP theo vai trò.
    Staffing {
        /// File JSON `StaffingRequest` đầy đủ (ma trận thời gian, phân bố lượt thăm).
        #[arg(long, conflicts_with_all = ["census", "hours"])]
        request: Option<PathBuf>,
        #[arg(long, default_value_t = 100)]
        census: u32,
        #[arg(long, default_value_t = 6.5)]
        hours: f64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let data = read(path)?;
            serde_json::from_str::<SchedulingConfig>(&data)
                .with_context(|| format!("Config không hợp lệ {:?}", path))?
        }
        None => SchedulingConfig::default(),
    };
    tracing::debug!(config = ?args.config, "configuration loaded");

    match args.command {
        Command::Route {
            patients,
            staff,
            date,
            role,
            staff_id,
        } => {
            let request = RouteRequest {
                date,
                role,
                staff_id,
            };
            let report = plan_route_str(&read(&patients)?, &read(&staff)?, &request, &config)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            let route = &report.route;
            println!(
                "Staff: {} ({})\nStops: {}/{}\nTime load: {:.0}%\nDistance: {:.2} km",
                route.staff_name,
                route.selection.date,
                route.stops.len(),
                route.capacity,
                route.time_load_percent,
                route.distance_km
            );
            for (position, stop) in route.stops.iter().enumerate() {
                println!("  {}. {} - {}", position + 1, stop.patient_name, stop.label);
            }
            if !report.skipped_patients.is_empty() || !report.skipped_staff.is_empty() {
                println!(
                    "Skipped records: {} patients, {} staff",
                    report.skipped_patients.len(),
                    report.skipped_staff.len()
                );
            }
        }
        Command::Agenda { patients, date } => {
            let report = agenda_str(&read(&patients)?, &date, &config)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!(
                "Generated at: {}\nAppointments: {}",
                report.generated_at,
                report.appointments.len()
            );
            for appointment in &report.appointments {
                println!(
                    "  {} {} - {}",
                    appointment.due_date, appointment.patient_name, appointment.visit_label
                );
            }
        }
        Command::Staffing {
            request,
            census,
            hours,
        } => {
            let report = match request {
                Some(path) => estimate_staffing_str(&read(&path)?, &config)?,
                None => {
                    let request = StaffingRequest {
                        census,
                        productive_hours: hours,
                        ..StaffingRequest::default()
                    };
                    capacity_report(&request, &config)?
                }
            };
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            for (role, etp) in &report.estimate.etp_per_role {
                println!("  {}: {:.1}", role.label(), etp);
            }
            println!("{}", report.summary);
        }
    }

    Ok(())
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Không đọc được file {:?}", path))
}
