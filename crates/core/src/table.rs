use markscope_api::{ClassDescriptor, ClassName};
use std::collections::BTreeMap;

/// Explicit registration table of class declarations.
///
/// Fed by generated registration code, by hand, or by the structural scan.
/// Lookups through the introspector consult it before touching any file.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: BTreeMap<ClassName, ClassDescriptor>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous declaration registered under the same name.
    pub fn register(&mut self, class: ClassDescriptor) -> Option<ClassDescriptor> {
        self.classes.insert(class.name.clone(), class)
    }

    pub fn with(mut self, class: ClassDescriptor) -> Self {
        self.register(class);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassDescriptor> for ClassTable {
    fn from_iter<I: IntoIterator<Item = ClassDescriptor>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl Extend<ClassDescriptor> for ClassTable {
    fn extend<I: IntoIterator<Item = ClassDescriptor>>(&mut self, iter: I) {
        for class in iter {
            self.register(class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markscope_api::ClassKind;

    #[test]
    fn test_register_replaces_by_name() {
        let mut table = ClassTable::new().with(ClassDescriptor::new("App\\A", ClassKind::Class));
        let previous = table.register(ClassDescriptor::new("App\\A", ClassKind::AbstractClass));
        assert_eq!(previous.map(|c| c.kind), Some(ClassKind::Class));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("App\\A").map(|c| c.kind), Some(ClassKind::AbstractClass));
        assert!(!table.contains("App\\B"));
    }
}
