//! XML-like dumps of a widget tree.
//!
//! One element per widget, tagged with its class and nested by tree
//! structure. Indentation is for people; [`same_dump`] compares two dumps
//! with whitespace ignored.

use std::fmt::{self, Write};

use crate::{Layout, Position, Rectangle, Text, Widget};

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\0' => out.push_str("&#0;"),
            c => out.push(c),
        }
    }
    out
}

fn write_position(out: &mut dyn Write, tag: &str, p: &Position, indent: usize) -> fmt::Result {
    writeln!(
        out,
        "{:indent$}<{tag} sx=\"{}\" sy=\"{}\" ref=\"{}\" norm-x=\"{}\" norm-y=\"{}\"/>",
        "",
        p.sx,
        p.sy,
        p.widget_ref,
        p.norm_x.as_str(),
        p.norm_y.as_str(),
    )
}

fn write_layout(out: &mut dyn Write, layout: &Layout, indent: usize) -> fmt::Result {
    write!(out, "{:indent$}<layout thickness=\"{}\"", "", layout.thickness)?;
    if let Some(pin) = layout.pin {
        write!(out, " pin=\"{}\"", pin.as_str())?;
    }
    writeln!(out, ">")?;
    write_position(out, "upper-left", &layout.upper_left, indent + 2)?;
    write_position(out, "lower-right", &layout.lower_right, indent + 2)?;
    writeln!(out, "{:indent$}</layout>", "")
}

fn write_text(out: &mut dyn Write, w: &Widget, text: &Text, indent: usize) -> fmt::Result {
    write!(
        out,
        "{:indent$}<text align=\"{}\" size=\"{}\"",
        "",
        text.align.as_str(),
        w.draw.char_size,
    )?;
    if let Some(group) = text.group {
        write!(out, " group=\"{group}\"")?;
    }
    if text.mark != crate::BulletMark::None {
        write!(out, " mark=\"{}\"", text.mark.as_str())?;
    }
    writeln!(out, ">{}</text>", escape(&w.draw.label))
}

fn write_rect(out: &mut dyn Write, tag: &str, r: &Rectangle, indent: usize) -> fmt::Result {
    writeln!(
        out,
        "{:indent$}<{tag} x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" border=\"{}\"/>",
        "", r.ux, r.uy, r.width, r.height, r.border,
    )
}

impl Widget {
    /// Write this widget and its subtree. An installed serialize hook
    /// replaces the element for its widget.
    pub fn serialize(&self, out: &mut dyn Write, indent: usize) -> fmt::Result {
        if let Some(hook) = &self.methods.serialize {
            return hook(self, out, indent);
        }
        self.default_serialize(out, indent)
    }

    pub fn default_serialize(&self, out: &mut dyn Write, indent: usize) -> fmt::Result {
        let tag = self.class.as_str();
        write!(out, "{:indent$}<{tag} id=\"{}\"", "", self.draw.id)?;
        if self.is_hidden() {
            write!(out, " hidden=\"true\"")?;
        }
        if self.is_disabled() {
            write!(out, " disabled=\"true\"")?;
        }
        if self.draw.selected {
            write!(out, " selected=\"true\"")?;
        }
        if !self.successful_layout() {
            write!(out, " layout-failed=\"true\"")?;
        }
        writeln!(out, ">")?;
        let inner = indent + 2;
        write_layout(out, &self.layout, inner)?;
        write_rect(out, "rect", &self.draw.rect, inner)?;
        if let Some(text) = &self.text {
            write_text(out, self, text, inner)?;
            write_rect(out, "label-bounds", &self.draw.label_bounds, inner)?;
        }
        for child in &self.children {
            child.serialize(out, inner)?;
        }
        writeln!(out, "{:indent$}</{tag}>", "")
    }

    /// The subtree's dump as a string.
    pub fn to_dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail unless a hook reports an error;
        // the partial dump is still useful then.
        if self.serialize(&mut out, 0).is_err() {
            out.push_str("<!-- serialize hook failed -->\n");
        }
        out
    }
}

/// Compare two dumps, ignoring whitespace.
pub fn same_dump(a: &str, b: &str) -> bool {
    a.chars()
        .filter(|c| !c.is_whitespace())
        .eq(b.chars().filter(|c| !c.is_whitespace()))
}
