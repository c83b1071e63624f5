//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


//! Immutable capability registries and their builder.

use super::{Capability, CapabilityError, FnCapability, RegistryError, StreamCapability};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Public description of one capability, served by the capability directory.
///
/// `input` and `output` are free-form JSON shape descriptions (for example a
/// JSON Schema fragment) that let a remote build typed callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Unique capability name.
    pub name: String,
    /// Human-readable summary.
    #[serde(default)]
    pub description: String,
    /// Shape of the expected input.
    #[serde(default)]
    pub input: Value,
    /// Shape of the produced output.
    #[serde(default)]
    pub output: Value,
}

impl CapabilityDescriptor {
    /// Creates a descriptor with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input: Value::Null,
            output: Value::Null,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the input shape.
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    /// Sets the output shape.
    pub fn with_output(mut self, output: Value) -> Self {
        self.output = output;
        self
    }
}

struct Entry {
    descriptor: CapabilityDescriptor,
    handler: Arc<dyn Capability>,
}

/// A fixed set of named capabilities.
///
/// Lookups only match names that were explicitly registered; there are no
/// built-in or default entries, so names such as `constructor` or
/// `toString` are unknown unless someone registered them.
pub struct Registry {
    entries: HashMap<String, Entry>,
}

impl Registry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns a registry with no capabilities, for peers that only call out.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Looks up a capability by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.entries.get(name).map(|entry| Arc::clone(&entry.handler))
    }

    /// Returns `true` if `name` was registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no capability is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the descriptors of every capability, sorted by name.
    #[must_use]
    pub fn directory(&self) -> Vec<CapabilityDescriptor> {
        let mut descriptors: Vec<_> = self
            .entries
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("capabilities", &names).finish()
    }
}

/// Builder for [`Registry`].
///
/// Registration errors (empty or duplicate names) are reported by
/// [`build`](Self::build) so that the chain stays fluent.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<Entry>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability implementation under `descriptor.name`.
    pub fn with_capability(
        mut self,
        descriptor: CapabilityDescriptor,
        handler: impl Capability,
    ) -> Self {
        self.entries.push(Entry {
            descriptor,
            handler: Arc::new(handler),
        });
        self
    }

    /// Registers an async closure returning a single value.
    pub fn with_function<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CapabilityError>> + Send + 'static,
    {
        self.with_capability(CapabilityDescriptor::new(name), FnCapability::new(f))
    }

    /// Registers a closure returning a stream of values.
    pub fn with_stream<F, S>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> S + Send + Sync + 'static,
        S: Stream<Item = Result<Value, CapabilityError>> + Send + 'static,
    {
        self.with_capability(CapabilityDescriptor::new(name), StreamCapability::new(f))
    }

    /// Finishes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyName`] or [`RegistryError::Duplicate`]
    /// if a name is empty or repeated.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut entries = HashMap::with_capacity(self.entries.len());
        for entry in self.entries {
            let name = entry.descriptor.name.clone();
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if entries.contains_key(&name) {
                return Err(RegistryError::Duplicate { name });
            }
            entries.insert(name, entry);
        }
        Ok(Registry { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn echo(input: Value) -> Result<Value, CapabilityError> {
        Ok(input)
    }

    #[test]
    fn test_lookup_only_matches_registered_names() {
        let registry = Registry::builder().with_function("echo", echo).build().unwrap();

        assert!(registry.get("echo").is_some());
        for name in [
            "constructor",
            "__proto__",
            "toString",
            "hasOwnProperty",
            "valueOf",
            "",
            "ECHO",
        ] {
            assert!(registry.get(name).is_none(), "{} resolved", name);
        }
    }

    #[test]
    fn test_inherited_looking_names_can_be_registered() {
        let registry = Registry::builder()
            .with_function("constructor", echo)
            .build()
            .unwrap();
        assert!(registry.contains("constructor"));
        assert!(!registry.contains("toString"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Registry::builder()
            .with_function("echo", echo)
            .with_function("echo", echo)
            .build();
        assert_eq!(
            result.unwrap_err(),
            RegistryError::Duplicate {
                name: "echo".to_string()
            }
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Registry::builder().with_function("", echo).build();
        assert_eq!(result.unwrap_err(), RegistryError::EmptyName);
    }

    #[test]
    fn test_directory_is_sorted_and_described() {
        let registry = Registry::builder()
            .with_function("zeta", echo)
            .with_capability(
                CapabilityDescriptor::new("alpha")
                    .with_description("Echoes its input")
                    .with_input(json!({"type": "object"}))
                    .with_output(json!({"type": "object"})),
                FnCapability::new(echo),
            )
            .build()
            .unwrap();

        let directory = registry.directory();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory[0].name, "alpha");
        assert_eq!(directory[0].description, "Echoes its input");
        assert_eq!(directory[0].input, json!({"type": "object"}));
        assert_eq!(directory[1].name, "zeta");
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        assert!(Registry::empty().is_empty());
    }

    #[test]
    fn test_descriptor_wire_shape() {
        let descriptor = CapabilityDescriptor::new("echo").with_description("d");
        let encoded = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            encoded,
            json!({"name": "echo", "description": "d", "input": null, "output": null})
        );
        let decoded: CapabilityDescriptor =
            serde_json::from_value(json!({"name": "echo"})).unwrap();
        assert_eq!(decoded, CapabilityDescriptor::new("echo"));
    }
}
