use console::Style;
use once_cell::sync::Lazy;

pub static PROMPT: Lazy<Style> = Lazy::new(|| Style::new().bold());
pub static WARNING: Lazy<Style> = Lazy::new(|| Style::new().yellow());
pub static PLACE: Lazy<Style> = Lazy::new(|| Style::new().color256(246).italic());
pub static RULE: Lazy<Style> = Lazy::new(|| Style::new().dim());
