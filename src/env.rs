use std::collections::BTreeMap;

/// Named host functions, keyed by import name
pub type FunctionTable<T> = BTreeMap<String, T>;

/// Flat import table handed to the module at instantiation.
///
/// Tables are merged in call order and the last writer wins on a shared key.
/// Importing never clears earlier entries and never touches the source table.
#[derive(Debug, Clone)]
pub struct Environment<T> {
    entries: BTreeMap<String, T>,
}

impl<T> Default for Environment<T> {
    fn default() -> Self {
        Environment {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Clone> Environment<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `table` in, renaming every key to `prefix + key`
    pub fn import(&mut self, table: &FunctionTable<T>, prefix: Option<&str>) -> &mut Self {
        let prefix = prefix.unwrap_or("");
        for (name, function) in table {
            self.entries
                .insert(format!("{}{}", prefix, name), function.clone());
        }
        self
    }

    /// Single entry, no prefix
    pub fn insert(&mut self, name: &str, function: T) -> &mut Self {
        self.entries.insert(name.to_string(), function);
        self
    }
}

impl<T> Environment<T> {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, f)| (name.as_str(), f))
    }
}

// ==================== JS Import Object ====================
#[cfg(target_arch = "wasm32")]
mod js {
    use super::Environment;
    use anyhow::{anyhow, Result};
    use js_sys::{Object, Reflect};
    use wasm_bindgen::JsValue;

    impl Environment<JsValue> {
        /// `{ [namespace]: { name: function, .. } }` for `WebAssembly.instantiate`
        pub fn to_import_object(&self, namespace: &str) -> Result<Object> {
            let table = Object::new();
            for (name, function) in self.iter() {
                Reflect::set(&table, &JsValue::from_str(name), function)
                    .map_err(|err| anyhow!("could not set import '{}' : {:#?}", name, err))?;
            }
            let imports = Object::new();
            Reflect::set(&imports, &JsValue::from_str(namespace), &table)
                .map_err(|err| anyhow!("could not set namespace '{}' : {:#?}", namespace, err))?;
            Ok(imports)
        }
    }
}
