use std::io::Write;

use colored::Colorize;
use comfy_table::{Cell, Table};

use ledgerview::db::{get_connection, load_ledger};
use ledgerview::error::{LedgerError, Result};
use ledgerview::fmt::{amount, percent};
use ledgerview::models::Ledger;
use ledgerview::settings::Settings;
use ledgerview::summarize::{
    summarize_balance, summarize_transactions, BalanceReport, BucketBy, DateRange, GroupBy, Report,
    SummaryOptions,
};

use super::{OutputFormat, RangeArgs};

fn open_ledger(settings: &Settings, range: DateRange) -> Result<Ledger> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(LedgerError::Other(format!(
            "No database at {}. Run `ledgerview init` first.",
            db_path.display()
        )));
    }
    let conn = get_connection(&db_path)?;
    load_ledger(&conn, range)
}

// ---------------------------------------------------------------------------
// Command wrappers
// ---------------------------------------------------------------------------

/// Options for one transactions report. Flags left unset fall back to settings.
fn summary_options(
    settings: &Settings,
    group_by: Option<GroupBy>,
    expense: bool,
    bucket_by: BucketBy,
    merge: Option<bool>,
) -> SummaryOptions {
    SummaryOptions {
        is_expense: expense,
        group_by: group_by.unwrap_or(settings.default_group_by),
        bucket_by,
        merge_under_threshold: merge.unwrap_or(settings.merge_under_threshold),
    }
}

pub fn transactions(
    settings: &Settings,
    args: &RangeArgs,
    expense: bool,
    bucket_by: BucketBy,
    merge: Option<bool>,
) -> Result<()> {
    let range = DateRange::parse(&args.from_date, &args.to_date)?;
    let options = summary_options(settings, args.group_by, expense, bucket_by, merge);
    let ledger = open_ledger(settings, range)?;
    let report = summarize_transactions(&ledger, range, &options)?;

    let mut out = std::io::stdout().lock();
    match args.format {
        OutputFormat::Table => {
            let title = if expense { "Expenses".red().bold() } else { "Income".green().bold() };
            writeln!(out, "{title} {range}\n{}", format_report(&report, &settings.currency_symbol))?;
        }
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?,
        OutputFormat::Csv => write_report_csv(&mut out, &report)?,
    }
    Ok(())
}

pub fn balance(settings: &Settings, args: &RangeArgs) -> Result<()> {
    let range = DateRange::parse(&args.from_date, &args.to_date)?;
    let group_by = args.group_by.unwrap_or(settings.default_group_by);
    let ledger = open_ledger(settings, range)?;
    let balance = summarize_balance(&ledger, range, group_by)?;

    let mut out = std::io::stdout().lock();
    match args.format {
        OutputFormat::Table => writeln!(
            out,
            "{} {range}\n{}",
            "Balance".bold(),
            format_balance(&balance, &settings.currency_symbol)
        )?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(&balance)?)?,
        OutputFormat::Csv => write_balance_csv(&mut out, &balance)?,
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Table and CSV rendering
// ---------------------------------------------------------------------------

fn header(first: &str, report: &Report) -> Vec<String> {
    let mut header = vec![first.to_string()];
    header.extend(report.buckets.iter().cloned());
    header.push("Total".to_string());
    header
}

fn amount_cells(values: &[f64], total: f64, symbol: &str) -> Vec<Cell> {
    values
        .iter()
        .chain(std::iter::once(&total))
        .map(|v| Cell::new(amount(*v, symbol)))
        .collect()
}

fn add_report_rows(table: &mut Table, report: &Report, symbol: &str, indent: &str) {
    for g in &report.groups {
        let mut row = vec![Cell::new(format!("{indent}{}", g.name))];
        row.extend(amount_cells(&g.data, g.total.unwrap_or_default(), symbol));
        table.add_row(row);
    }
}

pub fn format_report(report: &Report, symbol: &str) -> String {
    let mut table = Table::new();
    table.set_header(header("Group", report));
    add_report_rows(&mut table, report, symbol, "");

    let mut totals = vec![Cell::new("Total".bold())];
    totals.extend(amount_cells(&report.bucket_totals, report.sum_total, symbol));
    table.add_row(totals);

    table.to_string()
}

pub fn format_balance(balance: &BalanceReport, symbol: &str) -> String {
    let blank = || -> Vec<Cell> {
        std::iter::repeat_with(|| Cell::new(""))
            .take(balance.income.buckets.len() + 1)
            .collect()
    };

    let mut table = Table::new();
    table.set_header(header("", &balance.income));

    for (label, report, colored_label) in [
        ("Total Income", &balance.income, "INCOME".green().bold()),
        ("Total Expenses", &balance.expenses, "EXPENSES".red().bold()),
    ] {
        let mut row = vec![Cell::new(colored_label)];
        row.extend(blank());
        table.add_row(row);
        add_report_rows(&mut table, report, symbol, "  ");

        let mut totals = vec![Cell::new(label.bold())];
        totals.extend(amount_cells(&report.bucket_totals, report.sum_total, symbol));
        table.add_row(totals);
    }

    let savings_label = if balance.savings_total >= 0.0 {
        "SAVINGS".green().bold()
    } else {
        "SAVINGS".red().bold()
    };
    let mut savings = vec![Cell::new(savings_label)];
    savings.extend(amount_cells(&balance.savings, balance.savings_total, symbol));
    table.add_row(savings);

    let mut pct = vec![Cell::new("Savings %")];
    pct.extend(
        balance
            .savings_percentages
            .iter()
            .chain(std::iter::once(&balance.savings_total_percentage))
            .map(|p| Cell::new(percent(*p))),
    );
    table.add_row(pct);

    table.to_string()
}

fn csv_values(values: &[f64], total: f64) -> Vec<String> {
    values
        .iter()
        .chain(std::iter::once(&total))
        .map(|v| format!("{v:.2}"))
        .collect()
}

fn write_report_rows<W: Write>(
    wtr: &mut csv::Writer<W>,
    section: Option<&str>,
    report: &Report,
) -> Result<()> {
    let prefix: Vec<String> = section.map(|s| s.to_string()).into_iter().collect();
    for g in &report.groups {
        let mut record = prefix.clone();
        record.push(g.group_id.to_string());
        record.push(g.name.clone());
        record.extend(csv_values(&g.data, g.total.unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    let mut record = prefix;
    record.push(String::new());
    record.push("Total".to_string());
    record.extend(csv_values(&report.bucket_totals, report.sum_total));
    wtr.write_record(&record)?;
    Ok(())
}

pub fn write_report_csv<W: Write>(out: W, report: &Report) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut head = vec!["group_id".to_string()];
    head.extend(header("group", report));
    wtr.write_record(&head)?;
    write_report_rows(&mut wtr, None, report)?;
    wtr.flush()?;
    Ok(())
}

pub fn write_balance_csv<W: Write>(out: W, balance: &BalanceReport) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let mut head = vec!["section".to_string(), "group_id".to_string()];
    head.extend(header("group", &balance.income));
    wtr.write_record(&head)?;

    write_report_rows(&mut wtr, Some("income"), &balance.income)?;
    write_report_rows(&mut wtr, Some("expenses"), &balance.expenses)?;

    let mut savings = vec!["savings".to_string(), String::new(), "Savings".to_string()];
    savings.extend(csv_values(&balance.savings, balance.savings_total));
    wtr.write_record(&savings)?;

    let mut pct = vec!["savings_pct".to_string(), String::new(), "Savings %".to_string()];
    pct.extend(
        balance
            .savings_percentages
            .iter()
            .chain(std::iter::once(&balance.savings_total_percentage))
            .map(|p| p.to_string()),
    );
    wtr.write_record(&pct)?;
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerview::summarize::balance::compose;
    use ledgerview::summarize::postprocess::{run, CalcTotals, Postprocessor};
    use ledgerview::summarize::GroupId;

    fn report(rows: &[(i64, &str, [f64; 2])]) -> Report {
        let mut r = Report::new(vec!["2022-01".into(), "2022-02".into()]);
        for (id, name, data) in rows {
            r.add_group(GroupId::Real(*id), *name);
            r.groups.last_mut().unwrap().data = data.to_vec();
        }
        let steps: Vec<Box<dyn Postprocessor>> = vec![Box::new(CalcTotals)];
        run(r, &steps)
    }

    #[test]
    fn test_format_report_lists_groups_and_totals() {
        colored::control::set_override(false);
        let r = report(&[(1, "Groceries", [120.5, 80.0]), (2, "Rent", [1000.0, 1000.0])]);
        let s = format_report(&r, "$");
        assert!(s.contains("Groceries"));
        assert!(s.contains("2022-02"));
        assert!(s.contains("$1,000.00"));
        assert!(s.contains("$2,200.50"));
    }

    #[test]
    fn test_format_balance_shows_savings() {
        colored::control::set_override(false);
        let b = compose(
            report(&[(1, "Paycheck", [100.0, 0.0])]),
            report(&[(2, "Rent", [40.0, 10.0])]),
        )
        .unwrap();
        let s = format_balance(&b, "");
        assert!(s.contains("INCOME"));
        assert!(s.contains("EXPENSES"));
        assert!(s.contains("SAVINGS"));
        assert!(s.contains("60%"));
        assert!(s.contains("-10.00"));
    }

    #[test]
    fn test_merge_flag_overrides_settings() {
        let mut settings = Settings::default();
        let opts = |s: &Settings, merge| summary_options(s, None, true, BucketBy::Month, merge);

        assert!(!opts(&settings, None).merge_under_threshold);
        assert!(opts(&settings, Some(true)).merge_under_threshold);

        settings.merge_under_threshold = true;
        assert!(opts(&settings, None).merge_under_threshold);
        assert!(!opts(&settings, Some(false)).merge_under_threshold);
    }

    #[test]
    fn test_group_by_falls_back_to_settings() {
        let mut settings = Settings::default();
        settings.default_group_by = GroupBy::Subcategory;
        let o = summary_options(&settings, None, false, BucketBy::Range, None);
        assert_eq!(o.group_by, GroupBy::Subcategory);
        let o = summary_options(&settings, Some(GroupBy::Category), false, BucketBy::Range, None);
        assert_eq!(o.group_by, GroupBy::Category);
    }

    #[test]
    fn test_report_csv() {
        let r = report(&[(7, "Rent", [500.0, 500.0])]);
        let mut buf = Vec::new();
        write_report_csv(&mut buf, &r).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "group_id,group,2022-01,2022-02,Total");
        assert_eq!(lines[1], "7,Rent,500.00,500.00,1000.00");
        assert_eq!(lines[2], ",Total,500.00,500.00,1000.00");
    }

    #[test]
    fn test_balance_csv() {
        let b = compose(
            report(&[(1, "Paycheck", [100.0, 0.0])]),
            report(&[(2, "Rent", [40.0, 10.0])]),
        )
        .unwrap();
        let mut buf = Vec::new();
        write_balance_csv(&mut buf, &b).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("section,group_id,group,2022-01,2022-02,Total\n"));
        assert!(text.contains("income,1,Paycheck,100.00,0.00,100.00\n"));
        assert!(text.contains("savings,,Savings,60.00,-10.00,50.00\n"));
        assert!(text.contains("savings_pct,,Savings %,60,0,50\n"));
    }
}
