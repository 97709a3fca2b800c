pub mod builtin;
pub mod codec;
pub mod plugin;
pub mod types;

use std::collections::HashMap;

use tracing::{debug, warn};

pub use builtin::clip::{ClipPlugin, ClipPluginCreator, CLIP_SERIALIZED_SIZE};
pub use plugin::{CreatorFactory, PluginCreator, PluginV2};
pub use types::{FieldData, PluginError, PluginField, PluginFieldType, RegistrationInfo, Result};

#[doc(hidden)]
pub use inventory;


/// Register a creator with the inventory system
#[macro_export]
macro_rules! register_creator {
    ($creator:ident) => {
        $crate::inventory::submit! {
            $crate::CreatorFactory {
                name:    <$creator as $crate::RegistrationInfo>::NAME,
                version: <$creator as $crate::RegistrationInfo>::VERSION,
                factory: || -> Box<dyn $crate::PluginCreator> { Box::new($creator::new()) },
            }
        }
    };
}


/// Lookup key of a registered creator
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CreatorKey {
    pub namespace: String,
    pub name:      String,
    pub version:   String,
}

impl CreatorKey {
    fn new(name: &str, version: &str, namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name:      name.to_string(),
            version:   version.to_string(),
        }
    }
}

/// Holds the creators a host engine can route build requests and
/// serialized plugins to.
#[derive(Default)]
pub struct PluginRegistry {
    map: HashMap<CreatorKey, Box<dyn PluginCreator>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate every creator submitted with `register_creator!`, in the
    /// default (empty) namespace.
    pub fn collect_inventory(&mut self) {
        for factory in inventory::iter::<CreatorFactory> {
            debug!(name = factory.name, version = factory.version, "collecting plugin creator");
            self.register_creator((factory.factory)(), "");
        }
    }

    /// Register `creator` under `namespace`. The first registration of a key
    /// wins; later duplicates return `false`.
    pub fn register_creator(&mut self, mut creator: Box<dyn PluginCreator>, namespace: &str) -> bool {
        let key = CreatorKey::new(creator.plugin_name(), creator.plugin_version(), namespace);
        if self.map.contains_key(&key) {
            warn!(?key, "plugin creator already registered");
            return false;
        }
        creator.set_plugin_namespace(namespace);
        debug!(?key, "registered plugin creator");
        self.map.insert(key, creator);
        true
    }

    pub fn get_creator(&self, name: &str, version: &str, namespace: &str) -> Option<&dyn PluginCreator> {
        self.map
            .get(&CreatorKey::new(name, version, namespace))
            .map(|b| b.as_ref())
    }

    /// Route a serialized plugin to its creator. The namespace is restored on
    /// the new instance since it is not part of the blob.
    pub fn deserialize(
        &self,
        plugin_type:   &str,
        version:       &str,
        namespace:     &str,
        instance_name: &str,
        data:          &[u8],
    ) -> Result<Box<dyn PluginV2>> {
        let creator = self.get_creator(plugin_type, version, namespace).ok_or_else(|| {
            PluginError::UnknownCreator {
                name:      plugin_type.to_string(),
                version:   version.to_string(),
                namespace: namespace.to_string(),
            }
        })?;
        let mut plugin = creator.deserialize_plugin(instance_name, data)?;
        plugin.set_plugin_namespace(namespace);
        Ok(plugin)
    }

    pub fn creator_keys(&self) -> Vec<&CreatorKey> {
        self.map.keys().collect()
    }
}
