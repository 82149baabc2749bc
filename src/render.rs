use colored::Colorize;

/// One report section: a collector's title plus its already-formatted lines.
#[derive(Debug)]
pub struct Section {
    pub title: String,
    pub body: Vec<String>,
}

impl Section {
    pub fn new(title: &str) -> Self {
        Section {
            title: title.to_string(),
            body: Vec::new(),
        }
    }

    pub fn line(&mut self, line: impl Into<String>) {
        self.body.push(line.into());
    }

    pub fn extend<I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.body.extend(lines);
    }
}

/// Appends a ranked table under a heading, or the given note when empty.
pub fn push_table(section: &mut Section, heading: &str, table: &[(String, u32)], empty_note: &str) {
    section.line(heading);
    if table.is_empty() {
        section.line(format!("  {}", empty_note));
        return;
    }
    for (key, count) in table {
        section.line(format!("  {:>6}  {}", count, key));
    }
}

/// Prints the full report: start banner, each section under a colored
/// header in the order given, completion banner.
pub fn print_report(sections: &[Section]) {
    println!("{}", "==== Server health scan started ====".green().bold());
    for section in sections {
        println!();
        println!("{}", format!("---- {} ----", section.title).cyan().bold());
        for line in &section.body {
            println!("{}", line);
        }
    }
    println!();
    println!("{}", "==== Server health scan complete ====".green().bold());
}
