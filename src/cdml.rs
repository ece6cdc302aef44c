//! Construction and serialization of the CDML `<dataset>` element.

use crate::config::options::ScanOptions;
use crate::mapping;
use crate::metadata::{AxisMeta, DatasetMeta, VarMeta};
use crate::utils::error::{Result, ScanError};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0"?>"#;
pub const CDML_DOCTYPE: &str =
    r#"<!DOCTYPE dataset SYSTEM "http://www-pcmdi.llnl.gov/software/cdms/cdml.dtd">"#;

/// Aggregated time axis built from the inventory rather than the
/// representative file, with the calendar already resolved.
#[derive(Debug, Clone)]
pub struct TimeAggregate {
    pub id: String,
    pub calendar: String,
    pub values: Vec<f64>,
    pub partition: Vec<usize>,
}

/// A write-once XML element with insertion-ordered attributes.
#[derive(Debug, Clone, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: Option<String>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element {
            name: name.to_string(),
            ..Element::default()
        }
    }

    /// Set an attribute, replacing the value in place if the name exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.iter().any(|(n, _)| n == name)
    }

    pub fn append(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn render(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_into(&mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(|e| ScanError::ProcessingError {
            message: format!("serialized document is not valid UTF-8: {}", e),
        })
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            return write_event(writer, Event::Empty(start));
        }

        write_event(writer, Event::Start(start))?;
        if let Some(text) = &self.text {
            write_event(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| ScanError::ProcessingError {
            message: format!("XML serialization failed: {}", e),
        })
}

/// Build the `<dataset>` element from the representative file metadata, the
/// aggregated time axis and the rendered file map.
pub fn build_dataset(
    meta: &DatasetMeta,
    time: &TimeAggregate,
    filemap: &str,
    directory: &str,
    options: &ScanOptions,
) -> Element {
    let promoted = options.promoted_attributes();
    let mut dataset = Element::new("dataset");

    for (name, value) in &meta.global_attrs {
        if promoted.iter().any(|p| p == name) {
            dataset.set(name.clone(), value.clone());
        } else {
            dataset.append(string_attr(name, value));
        }
    }

    dataset.set("cdms_filemap", filemap);
    dataset.set("directory", directory);
    dataset.set("id", options.dataset_id());
    for name in &promoted {
        if !dataset.has(name) {
            dataset.set(name.clone(), "");
        }
    }
    dataset.set("calendar", &time.calendar);

    let time_length = time.values.len().to_string();
    for axis in &meta.axes {
        dataset.append(build_axis(axis, time, &time_length));
    }
    for var in &meta.variables {
        dataset.append(build_variable(var, meta, time, &time_length));
    }

    dataset
}

fn build_axis(axis: &AxisMeta, time: &TimeAggregate, time_length: &str) -> Element {
    let mut elt = Element::new("axis");
    for (name, value) in &axis.attrs {
        elt.set(name.clone(), value.clone());
    }
    elt.set("id", &axis.id);
    elt.set("datatype", &axis.datatype);

    if axis.is_time {
        elt.set("calendar", &time.calendar);
        elt.set("length", time_length);
        elt.set("partition", mapping::render_partition(&time.partition));
        elt.set("id", &time.id);
        elt.set("name_in_file", &axis.id);
        elt.set_text(render_values(&time.values, false));
    } else {
        elt.set("length", axis.values.len().to_string());
        elt.append(string_attr("realtopology", axis.topology.as_str()));
        elt.set_text(render_values(&axis.values, axis.integral));
    }

    elt
}

fn build_variable(
    var: &VarMeta,
    meta: &DatasetMeta,
    time: &TimeAggregate,
    time_length: &str,
) -> Element {
    let mut elt = Element::new("variable");
    for (name, value) in &var.attrs {
        elt.set(name.clone(), value.clone());
    }
    elt.set("id", &var.id);
    elt.set("datatype", &var.datatype);

    let mut domain = Element::new("domain");
    for axis_id in &var.axes {
        let mut dom = Element::new("domElem");
        dom.set("start", "0");
        match meta.axis(axis_id) {
            Some(axis) if axis.is_time => {
                dom.set("length", time_length);
                dom.set("name", &time.id);
            }
            Some(axis) => {
                dom.set("length", axis.values.len().to_string());
                dom.set("name", axis_id.clone());
            }
            None => {
                dom.set("length", "0");
                dom.set("name", axis_id.clone());
            }
        }
        domain.append(dom);
    }
    elt.append(domain);

    elt
}

fn string_attr(name: &str, value: &str) -> Element {
    let mut attr = Element::new("attr");
    attr.set("datatype", "String");
    attr.set("name", name);
    attr.set_text(value);
    attr
}

fn render_values(values: &[f64], integral: bool) -> String {
    let joined = values
        .iter()
        .map(|&v| fmt_value(v, integral))
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{}]", joined)
}

fn fmt_value(value: f64, integral: bool) -> String {
    if integral {
        return format!("{}", value as i64);
    }
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Topology;

    fn sample_meta() -> DatasetMeta {
        DatasetMeta {
            global_attrs: vec![
                ("institution".to_string(), "CCSR/NIES".to_string()),
                ("title".to_string(), "surface air temperature".to_string()),
            ],
            axes: vec![
                AxisMeta {
                    id: "time".to_string(),
                    attrs: vec![("units".to_string(), "days since 1979-1-1".to_string())],
                    datatype: "Double".to_string(),
                    values: vec![15.5],
                    integral: false,
                    is_time: true,
                    units: Some("days since 1979-1-1".to_string()),
                    calendar: Some("standard".to_string()),
                    topology: Topology::Linear,
                },
                AxisMeta {
                    id: "lon".to_string(),
                    attrs: vec![("units".to_string(), "degrees_east".to_string())],
                    datatype: "Float".to_string(),
                    values: vec![0.0, 90.0, 180.0, 270.0],
                    integral: false,
                    is_time: false,
                    units: Some("degrees_east".to_string()),
                    calendar: None,
                    topology: Topology::Circular,
                },
            ],
            variables: vec![VarMeta {
                id: "tas".to_string(),
                attrs: vec![("units".to_string(), "K".to_string())],
                datatype: "Float".to_string(),
                axes: vec!["time".to_string(), "lon".to_string()],
                is_time_dependent: true,
            }],
        }
    }

    fn sample_time() -> TimeAggregate {
        TimeAggregate {
            id: "time".to_string(),
            calendar: "standard".to_string(),
            values: vec![15.5, 45.0],
            partition: vec![0, 1, 1, 2],
        }
    }

    #[test]
    fn test_element_render_escapes() {
        let mut elt = Element::new("attr");
        elt.set("name", "history");
        elt.set_text("a < b & c");
        assert_eq!(
            elt.render().unwrap(),
            r#"<attr name="history">a &lt; b &amp; c</attr>"#
        );
    }

    #[test]
    fn test_empty_element_self_closes() {
        let mut elt = Element::new("domElem");
        elt.set("start", "0");
        assert_eq!(elt.render().unwrap(), r#"<domElem start="0"/>"#);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut elt = Element::new("axis");
        elt.set("id", "abs_time");
        elt.set("datatype", "Double");
        elt.set("id", "time");
        assert_eq!(
            elt.render().unwrap(),
            r#"<axis id="time" datatype="Double"/>"#
        );
    }

    #[test]
    fn test_build_dataset_shape() {
        let meta = sample_meta();
        let time = sample_time();
        let options = ScanOptions::default();
        let dataset = build_dataset(
            &meta,
            &time,
            "[[[tas],[[0,2,-,-,-,f.nc]]],[[],[[-,-,-,-,-,f.nc]]]]",
            "/data",
            &options,
        );
        let xml = dataset.render().unwrap();

        assert!(xml.starts_with(r#"<dataset institution="CCSR/NIES" cdms_filemap="#));
        assert!(xml.contains(r#"directory="/data""#));
        assert!(xml.contains(r#"id="none""#));
        // promoted attributes missing from the file appear empty
        assert!(xml.contains(r#"production="""#));
        assert!(xml.contains(r#"calendar="standard""#));
        // non-promoted globals become attr children
        assert!(
            xml.contains(r#"<attr datatype="String" name="title">surface air temperature</attr>"#)
        );
        // the time axis carries the aggregated values and partition
        assert!(xml.contains(r#"partition="[0 1 1 2]""#));
        assert!(xml.contains(r#"name_in_file="time""#));
        assert!(xml.contains("[15.5 45.0]"));
        // circular longitude is flagged
        assert!(xml.contains(r#"<attr datatype="String" name="realtopology">circular</attr>"#));
        // the variable domain aggregates over time
        assert!(xml.contains(r#"<domElem start="0" length="2" name="time"/>"#));
        assert!(xml.contains(r#"<domElem start="0" length="4" name="lon"/>"#));
    }

    #[test]
    fn test_resolved_calendar_flows_through() {
        let meta = sample_meta();
        let mut time = sample_time();
        time.calendar = "noleap".to_string();
        let options = ScanOptions::default();
        let dataset = build_dataset(&meta, &time, "[]", "/data", &options);
        let xml = dataset.render().unwrap();
        assert!(xml.contains(r#"calendar="noleap""#));
        assert!(!xml.contains(r#"calendar="standard""#));
    }

    #[test]
    fn test_fmt_value() {
        assert_eq!(fmt_value(15.5, false), "15.5");
        assert_eq!(fmt_value(45.0, false), "45.0");
        assert_eq!(fmt_value(1000.0, true), "1000");
    }
}
