use alloc::borrow::ToOwned;

use ini_core as ini;

use crate::codec;
use crate::data_type::DataType;
use crate::error::AbortCode;
use crate::prelude::*;
use crate::value::{get_value, ByteConvertible, Value};
use crate::{info, util};

#[derive(Clone, Debug, PartialEq)]
pub struct AccessType {
    read_access: bool,
    write_access: bool,
}

impl AccessType {
    pub fn new(read: bool, write: bool) -> Self {
        AccessType {
            read_access: read,
            write_access: write,
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "rw" | "rwr" | "rww" => Ok(AccessType::new(true, true)),
            "ro" | "const" => Ok(AccessType::new(true, false)),
            "wo" => Ok(AccessType::new(false, true)),
            _ => Ok(AccessType::new(false, false)),
        }
    }

    pub fn is_readable(&self) -> bool {
        self.read_access
    }
    pub fn is_writable(&self) -> bool {
        self.write_access
    }
}

/// A single addressable entry in the object dictionary. Kept `Clone` so
/// `Array::get_mut_variable` can synthesize sub-entries 2..N from the
/// template at sub-index 1 (CiA 306 §4.5.2.4's "compact sub-object" rule).
/// Because of that, per-entry indication callbacks are *not* stored here —
/// they live in `Device`'s separate registries, keyed by (index, sub_index).
#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct Sub {
    name: String,
    storage_location: String,
    data_type: DataType,
    default_value: Value,
    min: Option<Value>,
    max: Option<Value>,
    pdo_mappable: bool,
    access_type: AccessType,
    parameter_value: Option<Value>,
    index: u16,
    sub_index: u8,
    /// True if this entry's default/parameter value was computed with a
    /// `$NODEID` formula at load time; `Device::rebind_node_id` uses this to
    /// know which entries must be recomputed after an LSS node-id change.
    parse_nodeid: bool,
    nodeid_formula: Option<String>,
}

/// Alias kept so call sites written against either leaf type name resolve.
pub type Variable = Sub;

impl Sub {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn data_type(&self) -> DataType {
        self.data_type
    }
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }
    pub fn min(&self) -> &Option<Value> {
        &self.min
    }
    pub fn max(&self) -> &Option<Value> {
        &self.max
    }
    pub fn access_type(&self) -> &AccessType {
        &self.access_type
    }
    pub fn index(&self) -> u16 {
        self.index
    }
    pub fn sub_index(&self) -> u8 {
        self.sub_index
    }
    pub fn pdo_mappable(&self) -> bool {
        self.pdo_mappable
    }

    /// Checks `value` against this entry's configured min/max, if any.
    fn check_limits(&self, value: &Value) -> Result<(), AbortCode> {
        if let Some(min) = &self.min {
            if codec::compare(self.data_type, value, min) == core::cmp::Ordering::Less {
                return Err(AbortCode::ValueWrittenTooLow);
            }
        }
        if let Some(max) = &self.max {
            if codec::compare(self.data_type, value, max) == core::cmp::Ordering::Greater {
                return Err(AbortCode::ValueWrittenTooHigh);
            }
            if let Some(min) = &self.min {
                if codec::compare(self.data_type, min, max) == core::cmp::Ordering::Greater {
                    return Err(AbortCode::MaxValueLessThanMinValue);
                }
            }
        }
        Ok(())
    }
}

fn add_member_to_container(
    name_to_index: &mut HashMap<String, u8>,
    index_to_variable: &mut HashMap<u8, Sub>,
    var: Sub,
) {
    name_to_index.insert(var.name.clone(), var.sub_index);
    index_to_variable.insert(var.sub_index, var);
}

#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct Array {
    name: String,
    index: u16,
    storage_location: String,
    index_to_variable: HashMap<u8, Sub>,
    name_to_index: HashMap<String, u8>,
}

impl Array {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn index(&self) -> u16 {
        self.index
    }
}

impl Array {
    pub fn add_member(&mut self, var: Sub) {
        add_member_to_container(&mut self.name_to_index, &mut self.index_to_variable, var);
    }

    pub fn get_mut_variable(&mut self, sub_index: u8) -> Result<&mut Sub, AbortCode> {
        if self.index_to_variable.contains_key(&sub_index) {
            return self
                .index_to_variable
                .get_mut(&sub_index)
                .ok_or(AbortCode::ObjectDoesNotExistInObjectDictionary);
        }

        if 0 < sub_index && sub_index < 0xFF {
            // Compact sub-object expansion, CiA 306 §4.5.2.4: sub-entries
            // beyond the first are clones of sub-index 1 with a renumbered
            // name, synthesized lazily on first access.
            if let Some(base_var) = self.index_to_variable.get(&1) {
                let mut new_var = base_var.clone();
                new_var.name = format!("{}_{}", self.name, sub_index);
                new_var.sub_index = sub_index;
                self.add_member(new_var);
                return self
                    .index_to_variable
                    .get_mut(&sub_index)
                    .ok_or(AbortCode::ObjectDoesNotExistInObjectDictionary);
            }
        }
        Err(AbortCode::ObjectDoesNotExistInObjectDictionary)
    }
}

#[allow(dead_code)]
#[derive(Clone, Debug)]
pub struct Record {
    name: String,
    index: u16,
    storage_location: String,
    index_to_variable: HashMap<u8, Sub>,
    name_to_index: HashMap<String, u8>,
}

impl Record {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn index(&self) -> u16 {
        self.index
    }
    pub fn index_to_variable(&self) -> &HashMap<u8, Sub> {
        &self.index_to_variable
    }
    pub fn name_to_index(&self) -> &HashMap<String, u8> {
        &self.name_to_index
    }
}

impl Record {
    pub fn add_member(&mut self, var: Sub) {
        add_member_to_container(&mut self.name_to_index, &mut self.index_to_variable, var);
    }

    pub fn get_mut_variable(&mut self, sub_index: u8) -> Result<&mut Sub, AbortCode> {
        self.index_to_variable
            .get_mut(&sub_index)
            .ok_or(AbortCode::ObjectDoesNotExistInObjectDictionary)
    }

    pub fn get_variable_by_name(&self, name: &str) -> Result<&Sub, AbortCode> {
        if let Some(idx) = self.name_to_index.get(name) {
            self.index_to_variable.get(idx).ok_or(AbortCode::GeneralError)
        } else {
            Err(AbortCode::GeneralError)
        }
    }
}

#[derive(Clone, Debug)]
pub enum ObjectType {
    Variable(Sub),
    Array(Array),
    Record(Record),
}

pub fn obj_to_variable(obj: &ObjectType) -> Option<&Sub> {
    if let ObjectType::Variable(var) = obj {
        return Some(var);
    }
    None
}

pub fn obj_to_array(obj: &ObjectType) -> Option<&Array> {
    if let ObjectType::Array(arr) = obj {
        return Some(arr);
    }
    None
}

pub fn obj_to_record(obj: &ObjectType) -> Option<&Record> {
    if let ObjectType::Record(rec) = obj {
        return Some(rec);
    }
    None
}

type WriteIndication = Box<dyn FnMut(&[u8]) -> Result<(), AbortCode>>;
type ReadIndication = Box<dyn FnMut() -> Option<Vec<u8>>>;

/// The object dictionary: an index/sub-index addressable tree of `Sub`
/// entries, grouped into `Variable`/`Array`/`Record` objects, plus a
/// registry of optional download/upload indication callbacks.
///
/// Named `Device` (rather than the EDS/DCF "object dictionary" wording) to
/// leave room for the dictionary to eventually own more than the tree
/// itself (it does not yet); `ObjectDirectory` is kept as a type alias for
/// code written against the older name.
pub struct Device {
    node_id: u8,
    index_to_object: HashMap<u16, ObjectType>,
    name_to_index: HashMap<String, u16>,
    write_indications: HashMap<(u16, u8), WriteIndication>,
    read_indications: HashMap<(u16, u8), ReadIndication>,
}

pub type ObjectDirectory = Device;

impl core::fmt::Debug for Device {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Device")
            .field("node_id", &self.node_id)
            .field("index_to_object", &self.index_to_object)
            .finish_non_exhaustive()
    }
}

impl Device {
    pub fn new(node_id: u8, eds_content: &str) -> Result<Self, String> {
        let mut od = Device {
            node_id,
            index_to_object: HashMap::new(),
            name_to_index: HashMap::new(),
            write_indications: HashMap::new(),
            read_indications: HashMap::new(),
        };
        od.load_from_content(eds_content)?;
        Ok(od)
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    /// Registers a callback invoked after a successful write to `(index,
    /// sub_index)`, with the newly written raw bytes. Used to react to SDO
    /// downloads into application objects without polling the tree.
    pub fn set_write_indication(&mut self, index: u16, sub_index: u8, callback: WriteIndication) {
        self.write_indications.insert((index, sub_index), callback);
    }

    /// Registers a callback invoked instead of reading the stored value for
    /// `(index, sub_index)`. Returning `None` falls back to the stored
    /// value, matching CiA's "process data on demand" upload indication.
    pub fn set_read_indication(&mut self, index: u16, sub_index: u8, callback: ReadIndication) {
        self.read_indications.insert((index, sub_index), callback);
    }

    /// Re-derives the value of every entry whose EDS source used a
    /// `$NODEID` formula, after the node's id changes (e.g. via LSS
    /// `configure_node_id` + `store_configuration` + reset). Entries
    /// without a stored formula are left untouched.
    pub fn rebind_node_id(&mut self, new_node_id: u8) {
        self.node_id = new_node_id;
        let mut updates: Vec<(u16, u8, Value)> = Vec::new();
        for obj in self.index_to_object.values() {
            let subs: Vec<&Sub> = match obj {
                ObjectType::Variable(v) => vec![v],
                ObjectType::Array(a) => a.index_to_variable.values().collect(),
                ObjectType::Record(r) => r.index_to_variable.values().collect(),
            };
            for sub in subs {
                if sub.parse_nodeid {
                    if let Some(formula) = &sub.nodeid_formula {
                        let rewritten = util::to_value_with_node_id(new_node_id as u16, formula);
                        if let Ok(val) = crate::value::parse_with_type(&sub.data_type, &rewritten) {
                            updates.push((sub.index, sub.sub_index, val));
                        }
                    }
                }
            }
        }
        for (index, sub_index, val) in updates {
            let _ = self.set_value(index, sub_index, val.as_slice(), true);
        }
    }

    pub fn add_member(&mut self, index: u16, name: String, obj: ObjectType) {
        self.index_to_object.insert(index, obj);
        self.name_to_index.insert(name, index);
    }

    pub fn add_sub_member(&mut self, index: u16, var: Sub) -> Result<(), String> {
        match self.index_to_object.get_mut(&index) {
            None => Err(format!("No id:{:x?}", index)),
            Some(ObjectType::Record(record)) => Ok(record.add_member(var)),
            Some(ObjectType::Array(array)) => Ok(array.add_member(var)),
            _ => Err("no subindex for a Variable object".to_string()),
        }
    }

    pub fn set_value_with_fitting_size(&mut self, index: u16, sub_index: u8, data: &[u8]) {
        match self.get_mut_variable(index, sub_index) {
            Err(_) => {}
            Ok(var) => {
                if !var.access_type.is_writable() {
                    return;
                }
                if var.data_type.size() > data.len() {
                    return;
                }
                var.default_value
                    .set_data(data[0..var.data_type.size()].to_vec());
            }
        }
    }

    pub fn set_value(
        &mut self,
        index: u16,
        sub_index: u8,
        data: &[u8],
        ignore_access_check: bool,
    ) -> Result<&Sub, AbortCode> {
        {
            let var = self.get_mut_variable(index, sub_index)?;
            if !ignore_access_check && !var.access_type.is_writable() {
                return Err(AbortCode::AttemptToWriteReadOnlyObject);
            }

            if var.data_type.is_fixed_length() && var.data_type.size() != data.len() {
                info!(
                    "set_value() error: expect data_type size = {}, input data len = {}, data: {:?}",
                    var.data_type.size(),
                    data.len(),
                    data
                );
                return Err(if var.data_type.size() > data.len() {
                    AbortCode::DataTypeMismatchLengthTooLow
                } else {
                    AbortCode::DataTypeMismatchLengthTooHigh
                });
            }

            let candidate = Value::new(data.to_vec());
            var.check_limits(&candidate)?;
            var.default_value.set_data(data.to_vec());
        }

        if let Some(callback) = self.write_indications.get_mut(&(index, sub_index)) {
            callback(data)?;
        }

        // Re-borrow: the indication above needed `self` mutably too.
        self.get_variable_ignoring_access(index, sub_index)
    }

    fn get_variable_ignoring_access(&mut self, index: u16, sub_index: u8) -> Result<&Sub, AbortCode> {
        self.get_mut_variable(index, sub_index).map(|v| &*v)
    }

    pub fn get_variable(&mut self, index: u16, sub_index: u8) -> Result<&Sub, AbortCode> {
        if let Some(callback) = self.read_indications.get_mut(&(index, sub_index)) {
            if let Some(bytes) = callback() {
                self.set_value_with_fitting_size(index, sub_index, &bytes);
            }
        }
        match self.get_mut_variable(index, sub_index) {
            Ok(var) => {
                if !var.access_type.is_readable() {
                    return Err(AbortCode::AttemptToReadWriteOnlyObject);
                }
                Ok(var)
            }
            Err(code) => Err(code),
        }
    }

    pub fn get_mut_variable(&mut self, index: u16, sub_index: u8) -> Result<&mut Sub, AbortCode> {
        match self.index_to_object.get_mut(&index) {
            Some(ObjectType::Variable(var)) => {
                if sub_index == 0 {
                    Ok(var)
                } else {
                    Err(AbortCode::SubIndexDoesNotExist)
                }
            }
            Some(ObjectType::Array(arr)) => arr.get_mut_variable(sub_index),
            Some(ObjectType::Record(rec)) => rec.get_mut_variable(sub_index),
            None => Err(AbortCode::ObjectDoesNotExistInObjectDictionary),
        }
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<&ObjectType> {
        if let Some(id) = self.name_to_index.get(name) {
            return self.index_to_object.get(id);
        }
        None
    }

    pub fn get_mut_object(&mut self, index: u16) -> Option<&mut ObjectType> {
        self.index_to_object.get_mut(&index)
    }

    pub fn contains_index(&self, index: u16) -> bool {
        self.index_to_object.contains_key(&index)
    }

    /// Clones the addressable tree without the indication callback
    /// registries (those hold `Box<dyn FnMut>` and can't be cloned). Used to
    /// take the power-up backup copy NMT reset restores entries from;
    /// indications are re-registered by the driver, not carried by reset.
    pub fn snapshot(&self) -> Device {
        Device {
            node_id: self.node_id,
            index_to_object: self.index_to_object.clone(),
            name_to_index: self.name_to_index.clone(),
            write_indications: HashMap::new(),
            read_indications: HashMap::new(),
        }
    }

    /// All currently populated indexes. Used by `node.rs`'s NMT reset logic
    /// to decide which entries fall in a reset range without reaching into
    /// the tree's private storage.
    pub fn indexes(&self) -> Vec<u16> {
        self.index_to_object.keys().cloned().collect()
    }

    pub fn get_object(&self, index: u16) -> Option<&ObjectType> {
        self.index_to_object.get(&index)
    }

    pub fn remove_object(&mut self, index: u16) -> Option<ObjectType> {
        self.index_to_object.remove(&index)
    }

    pub fn insert_object(&mut self, index: u16, obj: ObjectType) {
        self.index_to_object.insert(index, obj);
    }

    /// Drops any name -> index mapping whose index no longer exists, after
    /// a range of entries has been removed via `remove_object`.
    pub fn prune_dangling_names(&mut self) {
        let live: &HashMap<u16, ObjectType> = &self.index_to_object;
        self.name_to_index.retain(|_name, index| live.contains_key(index));
    }

    pub fn process_section(
        &mut self,
        section_name: &str,
        properties: &HashMap<String, String>,
    ) -> Result<(), String> {
        if util::is_top(section_name) {
            let index = u16::from_str_radix(section_name, 16).map_err(|_| "Invalid index")?;
            let name = properties
                .get("ParameterName")
                .ok_or_else(|| format!("No 'ParameterName' in section <{}>", section_name))?;
            let ot: u32 = util::parse_number(
                properties
                    .get("ObjectType")
                    .ok_or_else(|| format!("No 'ObjectType' in section <{}>", section_name))?,
            );
            match ot {
                7 => {
                    let variable = build_variable(properties, self.node_id, name, index, None)?;
                    self.name_to_index.insert(variable.name.clone(), index);
                    self.index_to_object.insert(index, ObjectType::Variable(variable));
                }
                8 => {
                    let mut array = Array {
                        name: name.to_string(),
                        index,
                        storage_location: properties
                            .get("StorageLocation")
                            .unwrap_or(&String::from(""))
                            .to_owned(),
                        index_to_variable: HashMap::new(),
                        name_to_index: HashMap::new(),
                    };

                    if properties.contains_key("CompactSubObj") {
                        let last_subindex = Sub {
                            name: "Number of entries".to_string(),
                            index,
                            sub_index: 0,
                            data_type: DataType::Unsigned8,
                            default_value: Value::new(0u8.to_bytes()),
                            min: None,
                            max: None,
                            pdo_mappable: false,
                            access_type: AccessType::new(true, false),
                            storage_location: "".to_string(),
                            parameter_value: None,
                            parse_nodeid: false,
                            nodeid_formula: None,
                        };
                        array.add_member(last_subindex);
                        array.add_member(build_variable(properties, self.node_id, name, index, Some(1u8))?);
                    }
                    self.add_member(index, name.clone(), ObjectType::Array(array));
                }
                9 => {
                    let record = Record {
                        name: name.clone(),
                        index,
                        storage_location: properties
                            .get("StorageLocation")
                            .unwrap_or(&String::from(""))
                            .clone(),
                        index_to_variable: HashMap::new(),
                        name_to_index: HashMap::new(),
                    };
                    self.name_to_index.insert(name.clone(), index);
                    self.index_to_object.insert(index, ObjectType::Record(record));
                }
                _ => {
                    // VAR sub-type 2 (DOMAIN) and reserved object types are ignored.
                }
            }
        } else if let Some((index, sub_index)) = util::is_sub(section_name) {
            let name = properties
                .get("ParameterName")
                .ok_or_else(|| format!("No name in section <{}>", section_name))?;
            let variable = build_variable(properties, self.node_id, name, index, Some(sub_index))?;
            self.add_sub_member(index, variable)?;
        } else if let Some(index) = util::is_name(section_name) {
            let t = properties
                .get("NrOfEntries")
                .ok_or_else(|| format!("No NrOfEntries in section <{}>", section_name))?;
            let num_of_entries: u8 = t
                .parse()
                .map_err(|err| format!("Errors in parsing '{}' in section <{}>, err: {:?}", t, section_name, err))?;
            if let Some(ObjectType::Array(arr)) = self.index_to_object.get_mut(&index) {
                if let Some(src_var) = arr.index_to_variable.get(&1u8) {
                    let cloned_src_var = src_var.clone();
                    let mut new_vars = Vec::new();
                    for subindex in 1..=num_of_entries {
                        let mut var = cloned_src_var.clone();
                        if let Some(name) = properties.get(&subindex.to_string()) {
                            var.name = name.clone();
                            var.sub_index = subindex;
                            new_vars.push(var);
                        }
                    }
                    for var in new_vars {
                        arr.add_member(var);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn load_from_content(&mut self, content: &str) -> Result<(), String> {
        let mut current_section_name: Option<String> = None;
        let mut current_properties: HashMap<String, String> = HashMap::new();

        for item in ini::Parser::new(content) {
            match item {
                ini::Item::Section(name) => {
                    if let Some(section_name) = current_section_name.take() {
                        self.process_section(&section_name, &current_properties)?;
                        current_properties.clear();
                    }
                    current_section_name = Some(String::from(name));
                }
                ini::Item::Property(key, maybe_value) => {
                    let value = String::from(maybe_value.unwrap_or_default());
                    current_properties.insert(String::from(key), value);
                }
                _ => {}
            }
        }

        if let Some(section_name) = current_section_name {
            self.process_section(&section_name, &current_properties)?
        }

        Ok(())
    }
}

fn build_variable(
    properties: &HashMap<String, String>,
    node_id: u8,
    name: &String,
    index: u16,
    sub_index: Option<u8>,
) -> Result<Sub, String> {
    let storage_location = properties.get("StorageLocation").unwrap_or(&String::from("")).clone();
    let access_type = AccessType::from_str(
        &properties.get("AccessType").unwrap_or(&String::from("rw")).to_lowercase(),
    )?;
    let pdo_mapping = properties
        .get("PDOMapping")
        .unwrap_or(&String::from("0"))
        .parse::<i32>()
        .unwrap_or(0)
        != 0;

    let dt_val = util::parse_number(properties.get(&String::from("DataType")).unwrap_or(&String::from("")));
    let dt = DataType::from_u32(dt_val);

    let min = get_value(properties, "LowLimit", node_id as u16, &dt);
    let max = get_value(properties, "HighLimit", node_id as u16, &dt);

    let raw_default = properties.get("DefaultValue").cloned();
    let parse_nodeid = raw_default.as_deref().map(|s| s.contains("$NODEID")).unwrap_or(false);
    let default_value = get_value(properties, "DefaultValue", node_id as u16, &dt)
        .unwrap_or_else(|| Value::new(dt.default_value()));
    let parameter_value = get_value(properties, "ParameterValue", node_id as u16, &dt);

    Ok(Sub {
        name: name.clone(),
        storage_location,
        data_type: dt,
        access_type,
        pdo_mappable: pdo_mapping,
        min,
        max,
        default_value,
        parameter_value,
        index,
        sub_index: sub_index.unwrap_or(0),
        parse_nodeid,
        nodeid_formula: if parse_nodeid { raw_default } else { None },
    })
}
