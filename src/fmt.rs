/// Format an amount with thousands separators and two decimals: 1,234.56
///
/// `symbol` is placed after the sign: `-$500.00`.
pub fn amount(val: f64, symbol: &str) -> String {
    let negative = val < 0.0 && format!("{:.2}", val.abs()) != "0.00";
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    let sign = if negative { "-" } else { "" };
    format!("{sign}{symbol}{with_commas}.{dec_part}")
}

pub fn percent(val: i64) -> String {
    format!("{val}%")
}
