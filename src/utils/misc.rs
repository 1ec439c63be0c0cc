/// Renders a duration as its two most significant units, e.g.
/// `2 hours 5 minutes`. Negative durations count as zero.
pub fn time_to_string(time: chrono::Duration) -> String {
    let seconds = time.num_seconds().max(0);

    let units = [
        (seconds / 86400, "day"),
        (seconds % 86400 / 3600, "hour"),
        (seconds % 3600 / 60, "minute"),
        (seconds % 60, "second"),
    ];

    let parts: Vec<String> = units
        .iter()
        .skip_while(|(amount, _)| *amount == 0)
        .take(2)
        .filter(|(amount, _)| *amount > 0)
        .map(|(amount, unit)| {
            let suffix = if *amount == 1 { "" } else { "s" };
            format!("{amount} {unit}{suffix}")
        })
        .collect();

    match parts.is_empty() {
        true => "0 seconds".to_string(),
        false => parts.join(" "),
    }
}
