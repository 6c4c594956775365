//! ASCII art banner for interactive mode.

use std::io::IsTerminal;

/// ANSI true-color escape sequences for the banner palette.
struct Colors {
    gate: &'static str,
    water: &'static str,
    title: &'static str,
    subtitle: &'static str,
    reset: &'static str,
}

const COLOR: Colors = Colors {
    gate: "\x1b[38;2;120;120;135m",
    water: "\x1b[38;2;90;160;220m",
    title: "\x1b[1;38;2;240;120;60m",
    subtitle: "\x1b[38;2;100;100;120m",
    reset: "\x1b[0m",
};

const PLAIN: Colors = Colors {
    gate: "",
    water: "",
    title: "",
    subtitle: "",
    reset: "",
};

/// Prints the Floodgate banner to stdout.
///
/// Renders ANSI true-color when stdout is a terminal,
/// falls back to plain text otherwise.
pub fn print_banner() {
    let c = if std::io::stdout().is_terminal() {
        &COLOR
    } else {
        &PLAIN
    };

    let g = c.gate;
    let w = c.water;
    let tt = c.title;
    let st = c.subtitle;
    let r = c.reset;

    println!(
        r#"
{g}  ▐█▀▀▀▀▀▀▀█▌{r}      {tt}  ___ _    ___   ___  ___   ___   _ _____ ___{r}
{g}  ▐█{w}░░░░░░░{g}█▌{r}      {tt} | __| |  / _ \ / _ \|   \ / __| /_\_   _| __|{r}
{g}  ▐█{w}▒▒▒▒▒▒▒{g}█▌{r}      {tt} | _|| |_| (_) | (_) | |) | (_ |/ _ \| | | _|{r}
{g}  ▐█{w}▓▓▓▓▓▓▓{g}█▌{r}      {tt} |_| |____\___/ \___/|___/ \___/_/ \_\_| |___|{r}
{w}  ≈≈≈≈≈≈≈≈≈≈≈≈≈{r}
{w} ≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈{r}     {st}waiting for the gate to open{r}
"#
    );
}
