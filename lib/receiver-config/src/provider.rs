use std::path::Path;

use figment::{
    providers::{Data, Yaml},
    value::{Dict, Map},
    Error, Metadata, Profile, Provider,
};

/// A provider whose data has been read and parsed eagerly.
///
/// Reading up front means file errors surface when the source is added to the loader, rather than at extraction time.
pub struct ResolvedProvider {
    data: Map<Profile, Dict>,
    metadata: Metadata,
}

impl ResolvedProvider {
    pub fn from_yaml<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let file_data = std::fs::read_to_string(path.as_ref()).map_err(|e| e.to_string())?;
        let data = Data::<Yaml>::string(&file_data).data()?;

        Ok(Self {
            data,
            metadata: Metadata::from("YAML file", path.as_ref()),
        })
    }

    pub fn from_dict(name: &'static str, dict: Dict) -> Self {
        let mut data = Map::new();
        data.insert(Profile::Default, dict);

        Self {
            data,
            metadata: Metadata::named(name),
        }
    }
}

impl Provider for ResolvedProvider {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        Ok(self.data.clone())
    }
}
