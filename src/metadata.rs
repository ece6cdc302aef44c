//! Metadata extraction from the representative NetCDF file.
//!
//! Only one file of the collection is opened; its dimensions, variables and
//! attributes stand in for the whole virtual dataset. Values are read for
//! coordinate variables only.

use crate::utils::error::{Result, ScanError};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Linear,
    Circular,
}

impl Topology {
    pub fn as_str(self) -> &'static str {
        match self {
            Topology::Linear => "linear",
            Topology::Circular => "circular",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AxisMeta {
    pub id: String,
    pub attrs: Vec<(String, String)>,
    pub datatype: String,
    pub values: Vec<f64>,
    pub integral: bool,
    pub is_time: bool,
    pub units: Option<String>,
    pub calendar: Option<String>,
    pub topology: Topology,
}

#[derive(Debug, Clone)]
pub struct VarMeta {
    pub id: String,
    pub attrs: Vec<(String, String)>,
    pub datatype: String,
    pub axes: Vec<String>,
    pub is_time_dependent: bool,
}

#[derive(Debug, Clone)]
pub struct DatasetMeta {
    pub global_attrs: Vec<(String, String)>,
    pub axes: Vec<AxisMeta>,
    pub variables: Vec<VarMeta>,
}

impl DatasetMeta {
    pub fn time_axis(&self) -> Option<&AxisMeta> {
        self.axes.iter().find(|axis| axis.is_time)
    }

    pub fn axis(&self, id: &str) -> Option<&AxisMeta> {
        self.axes.iter().find(|axis| axis.id == id)
    }
}

pub fn read_dataset(path: &Path) -> Result<DatasetMeta> {
    let file = netcdf::open(path)?;

    let mut global_attrs = Vec::new();
    for attr in file.attributes() {
        global_attrs.push((attr.name().to_string(), stringify_attribute(&attr.value()?)));
    }

    let dim_names: Vec<String> = file.dimensions().map(|dim| dim.name()).collect();

    let mut axes = Vec::new();
    for dim in file.dimensions() {
        let name = dim.name();
        let axis = match file.variable(&name) {
            Some(var) => read_axis(&var)?,
            // A dimension without a coordinate variable gets index values,
            // the way cdms synthesizes a bare axis.
            None => AxisMeta {
                id: name.clone(),
                attrs: Vec::new(),
                datatype: "Double".to_string(),
                values: (0..dim.len()).map(|i| i as f64).collect(),
                integral: false,
                is_time: false,
                units: None,
                calendar: None,
                topology: Topology::Linear,
            },
        };
        axes.push(axis);
    }

    let time_id = axes
        .iter()
        .find(|axis| axis.is_time)
        .map(|axis| axis.id.clone());

    let mut variables = Vec::new();
    for var in file.variables() {
        let name = var.name();
        if dim_names.contains(&name) {
            continue; // coordinate variables are described as axes
        }

        let axes_of_var: Vec<String> = var.dimensions().iter().map(|dim| dim.name()).collect();
        let is_time_dependent = match &time_id {
            Some(time_id) => axes_of_var.iter().any(|dim| dim == time_id),
            None => false,
        };

        variables.push(VarMeta {
            id: name,
            attrs: collect_attrs(&var)?,
            datatype: cdml_datatype(&var.vartype()).to_string(),
            axes: axes_of_var,
            is_time_dependent,
        });
    }

    Ok(DatasetMeta {
        global_attrs,
        axes,
        variables,
    })
}

fn read_axis(var: &netcdf::Variable) -> Result<AxisMeta> {
    let id = var.name();
    let attrs = collect_attrs(var)?;

    let lookup = |name: &str| -> Option<String> {
        attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.clone())
    };

    let units = lookup("units");
    let calendar = lookup("calendar");
    let axis_hint = lookup("axis");
    let topology_attr = lookup("topology");

    let vartype = var.vartype();
    if matches!(vartype, NcVariableType::Char | NcVariableType::String) {
        return Err(ScanError::ProcessingError {
            message: format!("coordinate axis '{}' is not numeric", id),
        });
    }

    let values: Vec<f64> = var.get_values(..)?;
    let is_time = is_time_axis(&id, axis_hint.as_deref(), units.as_deref());
    let topology = if is_time {
        Topology::Linear
    } else {
        detect_topology(
            &id,
            axis_hint.as_deref(),
            units.as_deref(),
            topology_attr.as_deref(),
            &values,
        )
    };

    Ok(AxisMeta {
        id,
        attrs,
        datatype: cdml_datatype(&vartype).to_string(),
        integral: matches!(vartype, NcVariableType::Int(_)),
        values,
        is_time,
        units,
        calendar,
        topology,
    })
}

fn collect_attrs(var: &netcdf::Variable) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in var.attributes() {
        attrs.push((attr.name().to_string(), stringify_attribute(&attr.value()?)));
    }
    Ok(attrs)
}

/// CDML datatype name for a NetCDF variable type.
pub fn cdml_datatype(vartype: &NcVariableType) -> &'static str {
    match vartype {
        NcVariableType::Int(IntType::I8 | IntType::U8) => "Byte",
        NcVariableType::Int(IntType::I16 | IntType::U16) => "Short",
        NcVariableType::Int(IntType::I32 | IntType::U32) => "Int",
        NcVariableType::Int(IntType::I64 | IntType::U64) => "Long",
        NcVariableType::Float(FloatType::F32) => "Float",
        NcVariableType::Float(FloatType::F64) => "Double",
        _ => "String",
    }
}

pub fn stringify_attribute(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Uchar(v) => v.to_string(),
        AttributeValue::Schar(v) => v.to_string(),
        AttributeValue::Ushort(v) => v.to_string(),
        AttributeValue::Short(v) => v.to_string(),
        AttributeValue::Uint(v) => v.to_string(),
        AttributeValue::Int(v) => v.to_string(),
        AttributeValue::Ulonglong(v) => v.to_string(),
        AttributeValue::Longlong(v) => v.to_string(),
        AttributeValue::Float(v) => v.to_string(),
        AttributeValue::Double(v) => v.to_string(),
        AttributeValue::Str(v) => v.clone(),
        AttributeValue::Uchars(v) => join(v),
        AttributeValue::Schars(v) => join(v),
        AttributeValue::Ushorts(v) => join(v),
        AttributeValue::Shorts(v) => join(v),
        AttributeValue::Uints(v) => join(v),
        AttributeValue::Ints(v) => join(v),
        AttributeValue::Ulonglongs(v) => join(v),
        AttributeValue::Longlongs(v) => join(v),
        AttributeValue::Floats(v) => join(v),
        AttributeValue::Doubles(v) => join(v),
        AttributeValue::Strs(v) => v.join(" "),
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_time_axis(id: &str, axis_hint: Option<&str>, units: Option<&str>) -> bool {
    if axis_hint == Some("T") {
        return true;
    }
    if id.to_ascii_lowercase().starts_with("time") {
        return true;
    }
    units.is_some_and(|units| units.contains(" since "))
}

/// An axis is circular when it says so, or when it is longitude-like and one
/// more average step past the last value wraps back to the first modulo 360.
fn detect_topology(
    id: &str,
    axis_hint: Option<&str>,
    units: Option<&str>,
    topology_attr: Option<&str>,
    values: &[f64],
) -> Topology {
    if let Some(topology) = topology_attr {
        return if topology.eq_ignore_ascii_case("circular") {
            Topology::Circular
        } else {
            Topology::Linear
        };
    }

    let longitude_like = axis_hint == Some("X")
        || id.to_ascii_lowercase().starts_with("lon")
        || units == Some("degrees_east");
    if !longitude_like || values.len() < 2 {
        return Topology::Linear;
    }

    let first = values[0];
    let last = values[values.len() - 1];
    let spacing = (last - first) / (values.len() - 1) as f64;
    if (last - first + spacing - 360.0).abs() <= 360.0 * 0.005 {
        Topology::Circular
    } else {
        Topology::Linear
    }
}
