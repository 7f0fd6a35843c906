use arch::image::Program;
use color_print::cformat;

const RULE: &str = "-----------+-----------------------------------------------------";

/// Colored listing of the assembled program, one row per instruction.
pub fn render(program: &Program) -> Vec<String> {
    let mut rows = vec![];

    if !program.data.entries.is_empty() {
        rows.push(format!("{:-<11}+------[data]{:-<41}", "", ""));
        for entry in &program.data.entries {
            let label = program
                .data
                .labels
                .iter()
                .find(|(_, addr)| **addr == entry.addr)
                .map(|(name, _)| cformat!("<c>{}:</> ", name))
                .unwrap_or_default();
            let bytes: Vec<String> = entry.bytes.iter().take(8).map(|b| format!("{b:02X}")).collect();
            let more = if entry.bytes.len() > 8 { " .." } else { "" };
            rows.push(format!(
                "[{:08X}] | {:>4}: {}{}{}",
                entry.addr,
                entry.line,
                label,
                bytes.join(" "),
                more
            ));
        }
    }

    rows.push(format!("{:-<11}+------[text]{:-<41}", "", ""));
    for (addr, slot) in &program.text {
        if slot.index == 0 {
            if let Some(label) = program.label_at(*addr) {
                rows.push(cformat!("{:11}| <g>{}:</>", "", label));
            }
        }
        let line = program
            .lines
            .get(slot.source)
            .map(|line| line.line.to_string())
            .unwrap_or_default();
        let line = if slot.index == 0 { line } else { String::new() };
        rows.push(format!("[{:08X}] | {:>4}:   {}", addr, line, slot.inst.cformat()));
    }
    rows.push(RULE.to_string());
    rows
}

pub fn print(program: &Program) {
    for row in render(program) {
        println!("{row}");
    }
}
