//! Report output (CSV ledgers, plain-text export, console summary)

use anyhow::Result;
use csv::Writer;
use practice_billing::filter::PartyFilter;
use practice_billing::{MonthlyReport, Receipt};
use std::fmt::{Display, Write as _};
use std::path::Path;

use crate::constants;

/// Write every report file for a month
pub fn generate_all_reports(output_dir: &Path, report: &MonthlyReport) -> Result<()> {
    generate_receipts_ledger(output_dir, report)?;
    generate_lines_ledger(output_dir, report)?;
    generate_text_report(output_dir, report)?;
    Ok(())
}

/// Generate receipts.csv
fn generate_receipts_ledger(output_dir: &Path, report: &MonthlyReport) -> Result<()> {
    let path = output_dir.join(constants::RECEIPTS_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Month",
        "Client_Code",
        "Client",
        "Appointments",
        "Hours",
        "Subtotal",
        "Tax",
        "Grand_Total",
        "Therapist_Cost",
        "Profit",
        "Margin_Percent",
    ])?;

    for receipt in &report.receipts {
        wtr.write_record([
            &receipt.month.to_string(),
            &receipt.client_code,
            &receipt.client_name,
            &receipt.total_appointments.to_string(),
            &format!("{:.2}", receipt.total_hours),
            &format!("{:.2}", receipt.subtotal),
            &format!("{:.2}", receipt.tax),
            &format!("{:.2}", receipt.grand_total),
            &format!("{:.2}", receipt.therapist_cost_total),
            &format!("{:.2}", receipt.profit),
            &format!("{:.2}", receipt.margin_percent),
        ])?;
    }

    wtr.flush()?;
    println!("  Generated: {}", path.display());

    Ok(())
}

/// Generate receipt_lines.csv
fn generate_lines_ledger(output_dir: &Path, report: &MonthlyReport) -> Result<()> {
    let path = output_dir.join(constants::RECEIPT_LINES_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Client_Code",
        "Appointment_ID",
        "Date",
        "Start",
        "End",
        "Therapist",
        "Therapy_Type",
        "Hours",
        "Price",
        "Tax",
        "Total",
        "Therapist_Cost",
    ])?;

    for receipt in &report.receipts {
        for line in &receipt.lines {
            wtr.write_record([
                receipt.client_code.as_str(),
                line.appointment_id.as_ref().map(|id| id.as_str()).unwrap_or(""),
                &line.date.to_string(),
                &line.start_time,
                &line.end_time,
                &line.therapist_name,
                &line.therapy_type,
                &format!("{:.2}", line.duration_hours),
                &format!("{:.2}", line.price),
                &format!("{:.2}", line.tax),
                &format!("{:.2}", line.total),
                &format!("{:.2}", line.therapist_cost),
            ])?;
        }
    }

    wtr.flush()?;
    println!("  Generated: {}", path.display());

    Ok(())
}

/// Generate report_YYYY-MM.txt
fn generate_text_report(output_dir: &Path, report: &MonthlyReport) -> Result<()> {
    let path = output_dir.join(constants::text_report_filename(&report.month.to_string()));
    std::fs::write(&path, render_text(report))?;
    println!("  Generated: {}", path.display());
    Ok(())
}

fn filter_label<Id: Display>(filter: &PartyFilter<Id>) -> String {
    match filter {
        PartyFilter::All => constants::ALL_FILTER.to_string(),
        PartyFilter::Only(id) => id.to_string(),
    }
}

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}

fn render_receipt(out: &mut String, receipt: &Receipt) {
    let _ = writeln!(out, "RECEIPT {} - {}", receipt.client_code, receipt.client_name);
    let _ = writeln!(
        out,
        "  {:<10}  {:<11}  {:<20}  {:<18}  {:>6}  {:>10}  {:>9}  {:>10}",
        "Date", "Time", "Therapist", "Service", "Hours", "Price", "Tax", "Total"
    );
    for line in &receipt.lines {
        let _ = writeln!(
            out,
            "  {:<10}  {:<11}  {:<20}  {:<18}  {:>6.2}  {:>10.2}  {:>9.2}  {:>10.2}",
            line.date,
            format!("{}-{}", line.start_time, line.end_time),
            line.therapist_name,
            line.therapy_type,
            line.duration_hours,
            line.price,
            line.tax,
            line.total,
        );
    }
    let _ = writeln!(out, "  {}", "-".repeat(106));
    let _ = writeln!(
        out,
        "  Appointments: {:<4} Hours: {:.2}",
        receipt.total_appointments, receipt.total_hours
    );
    let _ = writeln!(out, "  Subtotal:        ${:>10.2}", normalize_zero(receipt.subtotal));
    let _ = writeln!(out, "  Tax:             ${:>10.2}", normalize_zero(receipt.tax));
    let _ = writeln!(out, "  Total:           ${:>10.2}", normalize_zero(receipt.grand_total));
    let _ = writeln!(out, "  Therapist cost:  ${:>10.2}", normalize_zero(receipt.therapist_cost_total));
    let _ = writeln!(out, "  Profit:          ${:>10.2}", normalize_zero(receipt.profit));
    let _ = writeln!(out, "  Margin:           {:>10.2}%", normalize_zero(receipt.margin_percent));
    out.push('\n');
}

/// Plain-text rendering of a monthly report
pub fn render_text(report: &MonthlyReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "============================================================");
    let _ = writeln!(out, "                MONTHLY REPORT: {}", report.month_label);
    let _ = writeln!(out, "============================================================");
    let _ = writeln!(
        out,
        "Therapist: {}    Client: {}\n",
        filter_label(&report.therapist_filter),
        filter_label(&report.client_filter)
    );

    for receipt in &report.receipts {
        render_receipt(&mut out, receipt);
    }

    if !report.rejected.is_empty() {
        let _ = writeln!(out, "NOT BILLED:");
        for rejected in &report.rejected {
            let _ = writeln!(
                out,
                "  {}  {}  {}",
                rejected.date,
                rejected.appointment_id.as_ref().map(|id| id.as_str()).unwrap_or("-"),
                rejected.reason
            );
        }
        out.push('\n');
    }

    let _ = writeln!(out, "TOTALS:");
    let _ = writeln!(out, "  Appointments:    {:>11}", report.total_appointments_all);
    let _ = writeln!(out, "  Hours:           {:>11.2}", report.total_hours_all);
    let _ = writeln!(out, "  Revenue:         ${:>10.2}", normalize_zero(report.total_revenue_all));
    let _ = writeln!(out, "  Therapist cost:  ${:>10.2}", normalize_zero(report.total_therapist_cost_all));
    let _ = writeln!(out, "  Profit:          ${:>10.2}", normalize_zero(report.total_profit_all));
    let _ = writeln!(out, "  Margin:           {:>10.2}%", normalize_zero(report.margin_percent_all));

    out
}

/// Print summary to console
pub fn print_summary(report: &MonthlyReport) {
    println!("\n============================================================");
    println!("                BILLING SUMMARY ({})", report.month_label);
    println!("============================================================\n");

    println!("RECEIPTS:");
    for receipt in &report.receipts {
        println!(
            "  {:<10} {:<24} {:>3} appts {:>7.2}h  ${:>10.2}",
            receipt.client_code,
            receipt.client_name,
            receipt.total_appointments,
            receipt.total_hours,
            normalize_zero(receipt.grand_total)
        );
    }
    if report.receipts.is_empty() {
        println!("  No completed appointments for this month.");
    }

    println!("\nTHERAPISTS:");
    for payout in &report.therapist_payouts {
        println!(
            "  {:<35} {:>3} appts {:>7.2}h  ${:>10.2}",
            payout.therapist_name,
            payout.total_appointments,
            payout.total_hours,
            normalize_zero(payout.total_cost)
        );
    }

    println!("\nPROFIT/LOSS:");
    println!("  Revenue:                        ${:>10.2}", normalize_zero(report.total_revenue_all));
    println!("  Therapist Cost:                 ${:>10.2}", normalize_zero(report.total_therapist_cost_all));
    println!("  ─────────────────────────────────────────────");
    println!("  Profit:                         ${:>10.2}", normalize_zero(report.total_profit_all));
    println!("  Margin:                          {:>10.2}%", normalize_zero(report.margin_percent_all));

    if !report.rejected.is_empty() {
        println!("\n  {} appointment(s) not billed (end before start)", report.rejected.len());
    }

    println!("============================================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use practice_billing::{generate_report, Appointment, AppointmentStatus, BillingConfig, Client, ReportRequest};

    fn sample_report() -> MonthlyReport {
        let appointments = vec![
            Appointment {
                id: Some("a1".into()),
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                client_id: "juan".into(),
                client_name: "Juan Pérez".to_string(),
                therapist_id: "ana".into(),
                therapist_name: "Ana García".to_string(),
                start_time: "09:00".to_string(),
                end_time: "11:00".to_string(),
                status: AppointmentStatus::Completed,
                therapy_type: "standard session".to_string(),
                client_rate: Some(450.0),
                client_total: None,
                therapist_rate: Some(200.0),
                therapist_total: Some(400.0),
            },
            Appointment {
                id: Some("a2".into()),
                date: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
                client_id: "juan".into(),
                client_name: "Juan Pérez".to_string(),
                therapist_id: "ana".into(),
                therapist_name: "Ana García".to_string(),
                start_time: "12:00".to_string(),
                end_time: "10:00".to_string(),
                status: AppointmentStatus::Completed,
                therapy_type: "standard session".to_string(),
                client_rate: Some(450.0),
                client_total: None,
                therapist_rate: None,
                therapist_total: None,
            },
        ];
        let clients = vec![Client {
            id: "juan".into(),
            name: "Juan Pérez".to_string(),
            code: "C-001".to_string(),
            custom_rates: Default::default(),
        }];
        let request = ReportRequest {
            appointments: &appointments,
            clients: &clients,
            month: "2024-01".parse().unwrap(),
            therapist: PartyFilter::All,
            client: PartyFilter::All,
        };
        generate_report(&request, &BillingConfig::default())
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample_report());

        assert!(text.contains("MONTHLY REPORT: Enero 2024"));
        assert!(text.contains("Therapist: all    Client: all"));
        assert!(text.contains("RECEIPT C-001 - Juan Pérez"));
        assert!(text.contains("2024-01-15  09:00-11:00"));
        assert!(text.contains("Total:           $   1044.00"));
        assert!(text.contains("NOT BILLED:"));
        assert!(text.contains("a2"));
        assert!(text.contains("Revenue:         $   1044.00"));
    }

    #[test]
    fn test_generate_all_reports_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        generate_all_reports(dir.path(), &report).unwrap();

        let receipts = std::fs::read_to_string(dir.path().join(constants::RECEIPTS_FILENAME)).unwrap();
        let mut rows = receipts.lines();
        assert!(rows.next().unwrap().starts_with("Month,Client_Code"));
        assert_eq!(
            rows.next().unwrap(),
            "2024-01,C-001,Juan Pérez,1,2.00,900.00,144.00,1044.00,400.00,644.00,61.69"
        );

        let lines = std::fs::read_to_string(dir.path().join(constants::RECEIPT_LINES_FILENAME)).unwrap();
        assert_eq!(lines.lines().count(), 2);

        assert!(dir.path().join("report_2024-01.txt").exists());
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(format!("{:.2}", normalize_zero(-0.0)), "0.00");
    }
}
