//! Render skill listings for a model prompt as an `<available_skills>` XML block.

use super::model::Frontmatter;

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Format skills (name and description) as an XML block.
pub fn format_skills_as_xml<'a, I>(skills: I) -> String
where
    I: IntoIterator<Item = &'a Frontmatter>,
{
    format_skills_as_xml_with_location(skills.into_iter().map(|s| (None, s)))
}

/// Format skills as an XML block, adding `<location>` for entries that have one.
pub fn format_skills_as_xml_with_location<'a, I>(skills: I) -> String
where
    I: IntoIterator<Item = (Option<String>, &'a Frontmatter)>,
{
    let mut lines = vec!["<available_skills>".to_string()];
    for (location, skill) in skills {
        lines.push("<skill>".to_string());
        lines.push("<name>".to_string());
        lines.push(escape(&skill.name));
        lines.push("</name>".to_string());
        lines.push("<description>".to_string());
        lines.push(escape(&skill.description));
        lines.push("</description>".to_string());
        if let Some(loc) = location.filter(|l| !l.is_empty()) {
            lines.push("<location>".to_string());
            lines.push(escape(&loc));
            lines.push("</location>".to_string());
        }
        lines.push("</skill>".to_string());
    }
    lines.push("</available_skills>".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing() {
        let none: Vec<Frontmatter> = Vec::new();
        assert_eq!(
            format_skills_as_xml(&none),
            "<available_skills>\n</available_skills>"
        );
    }

    #[test]
    fn escapes_and_includes_location() {
        let fm = Frontmatter::new("csv-tools", "Read <csv> & \"tsv\"");
        let xml = format_skills_as_xml_with_location([(Some("/skills/csv-tools/SKILL.md".to_string()), &fm)]);
        assert!(xml.contains("Read &lt;csv&gt; &amp; &quot;tsv&quot;"));
        assert!(xml.contains("<location>\n/skills/csv-tools/SKILL.md\n</location>"));
        let plain = format_skills_as_xml([&fm]);
        assert!(!plain.contains("<location>"));
    }

    #[test]
    fn location_is_escaped() {
        let fm = Frontmatter::new("notes", "Notes.");
        let xml = format_skills_as_xml_with_location([(Some("/srv/R&D <old>/notes/SKILL.md".to_string()), &fm)]);
        assert!(xml.contains("<location>\n/srv/R&amp;D &lt;old&gt;/notes/SKILL.md\n</location>"));
    }
}
