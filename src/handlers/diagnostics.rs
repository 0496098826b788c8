//! Probe results and the queries callers run over them.

use super::descriptor::DriverDescriptor;
use serde::Serialize;

/// Readiness of one descriptor on this host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverDiagnostics {
    pub descriptor: DriverDescriptor,
    pub is_ready: bool,
    /// Reasons for non-readiness, in the order they were found.
    pub status_details: Vec<String>,
}

impl DriverDiagnostics {
    /// Readiness follows from the reasons: none means ready.
    pub fn new(descriptor: DriverDescriptor, status_details: Vec<String>) -> Self {
        Self {
            descriptor,
            is_ready: status_details.is_empty(),
            status_details,
        }
    }

    pub fn driver_name(&self) -> &str {
        &self.descriptor.driver_name
    }
}

/// Diagnostics for every probed descriptor, in input (worst-to-best) order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiagnosticsCollection {
    items: Vec<DriverDiagnostics>,
}

impl DiagnosticsCollection {
    pub fn new(items: Vec<DriverDiagnostics>) -> Self {
        Self { items }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DriverDiagnostics> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ready_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_ready).count()
    }

    pub fn unavailable_count(&self) -> usize {
        self.items.iter().filter(|d| !d.is_ready).count()
    }

    /// Distinct driver names in first-seen order.
    pub fn driver_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for d in &self.items {
            if !names.contains(&d.driver_name()) {
                names.push(d.driver_name());
            }
        }
        names
    }

    /// A driver is ready if *any* entry with its name is ready.
    ///
    /// The same driver can be listed as both ready and not ready when it
    /// has two install modes; one working mode is enough.
    pub fn is_ready(&self, driver_name: &str) -> bool {
        self.items
            .iter()
            .any(|d| d.driver_name() == driver_name && d.is_ready)
    }

    /// Ready descriptors, worst to best.
    pub fn ready_descriptors(&self) -> impl Iterator<Item = &DriverDescriptor> {
        self.items
            .iter()
            .filter(|d| d.is_ready)
            .map(|d| &d.descriptor)
    }

    /// The last ready entry, i.e. the highest-ranked usable driver.
    pub fn preferred(&self) -> Option<&DriverDiagnostics> {
        self.items.iter().rev().find(|d| d.is_ready)
    }

    pub fn preferred_driver_name(&self) -> Option<&str> {
        self.preferred().map(DriverDiagnostics::driver_name)
    }
}

impl<'a> IntoIterator for &'a DiagnosticsCollection {
    type Item = &'a DriverDiagnostics;
    type IntoIter = std::slice::Iter<'a, DriverDiagnostics>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(name: &str) -> DriverDiagnostics {
        DriverDiagnostics::new(DriverDescriptor::new(name, ""), vec![])
    }

    fn unready(name: &str, reason: &str) -> DriverDiagnostics {
        DriverDiagnostics::new(DriverDescriptor::new(name, ""), vec![reason.to_string()])
    }

    #[test]
    fn readiness_follows_reasons() {
        assert!(ready("Gd").is_ready);
        assert!(!unready("Gd", "nope").is_ready);
    }

    #[test]
    fn counts_add_up() {
        let c = DiagnosticsCollection::new(vec![
            unready("Gd", "x"),
            ready("Imagick"),
            unready("Vips", "y"),
            ready("Vips"),
        ]);
        assert_eq!(c.ready_count(), 2);
        assert_eq!(c.unavailable_count(), 2);
        assert_eq!(c.ready_count() + c.unavailable_count(), c.len());
    }

    #[test]
    fn driver_names_are_deduplicated_in_order() {
        let c = DiagnosticsCollection::new(vec![
            ready("Gd"),
            ready("Vips"),
            ready("Imagick"),
            ready("Vips"),
        ]);
        assert_eq!(c.driver_names(), ["Gd", "Vips", "Imagick"]);
    }

    #[test]
    fn any_ready_entry_makes_driver_ready() {
        let c = DiagnosticsCollection::new(vec![unready("Vips", "no tools"), ready("Vips")]);
        assert!(c.is_ready("Vips"));

        let c = DiagnosticsCollection::new(vec![ready("Vips"), unready("Vips", "no ffi")]);
        assert!(c.is_ready("Vips"));
        assert!(!c.is_ready("Gd"));
    }

    #[test]
    fn preferred_is_last_ready_entry() {
        let c = DiagnosticsCollection::new(vec![
            ready("Gd"),
            ready("Imagick"),
            unready("Vips", "missing"),
        ]);
        assert_eq!(c.preferred_driver_name(), Some("Imagick"));
        let ready_names: Vec<_> = c.ready_descriptors().map(|d| d.driver_name.as_str()).collect();
        assert_eq!(ready_names, ["Gd", "Imagick"]);
    }

    #[test]
    fn empty_collection_has_no_preference() {
        let c = DiagnosticsCollection::default();
        assert!(c.is_empty());
        assert_eq!(c.ready_count(), 0);
        assert_eq!(c.preferred_driver_name(), None);
        assert!(c.driver_names().is_empty());
    }

    #[test]
    fn nothing_ready_has_no_preference() {
        let c = DiagnosticsCollection::new(vec![unready("Gd", "x"), unready("Imagick", "y")]);
        assert_eq!(c.preferred(), None);
    }

    #[test]
    fn serializes_as_plain_list() {
        let c = DiagnosticsCollection::new(vec![unready("Gd", "not loaded")]);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json[0]["descriptor"]["driver_name"], "Gd");
        assert_eq!(json[0]["is_ready"], false);
        assert_eq!(json[0]["status_details"][0], "not loaded");
    }
}
