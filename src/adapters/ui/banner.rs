//! ASCII banner with a green gradient, printed once at startup.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::ExecutableCommand;
use figlet_rs::FIGfont;
use std::io::{stdout, Write};

/// Light WhatsApp green (#25d366).
const GREEN_LIGHT: (u8, u8, u8) = (0x25, 0xd3, 0x66);
/// Dark teal (#128c7e).
const TEAL_DARK: (u8, u8, u8) = (0x12, 0x8c, 0x7e);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Prints "WA-BULK" in figlet with a light-green to teal gradient, then the
/// version. Best-effort: a broken terminal never aborts the run.
pub fn print_welcome() {
    let Ok(font) = FIGfont::standard() else {
        println!("wa-bulk v{}", env!("CARGO_PKG_VERSION"));
        return;
    };
    let Some(figure) = font.convert("WA-BULK") else {
        println!("wa-bulk v{}", env!("CARGO_PKG_VERSION"));
        return;
    };

    let mut out = stdout();
    let art = figure.to_string();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(GREEN_LIGHT, TEAL_DARK, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(SetForegroundColor(Color::Rgb {
        r: TEAL_DARK.0,
        g: TEAL_DARK.1,
        b: TEAL_DARK.2,
    }));
    let _ = out.execute(Print(format!("v{}\r\n", env!("CARGO_PKG_VERSION"))));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
