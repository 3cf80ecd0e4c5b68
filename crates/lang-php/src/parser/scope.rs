use markscope_api::ClassName;
use std::collections::HashMap;

/// Namespace and import state of the file being read.
#[derive(Debug, Default)]
pub struct Scope {
    namespace: Option<ClassName>,
    /// Lower-cased alias -> imported name.
    imports: HashMap<String, ClassName>,
}

impl Scope {
    /// Entering a namespace block forgets the previous block's imports.
    pub fn enter_namespace(&mut self, namespace: Option<&str>) {
        self.namespace = namespace
            .map(ClassName::new)
            .filter(|ns| !ns.as_str().is_empty());
        self.imports.clear();
    }

    pub fn import(&mut self, name: ClassName, alias: Option<&str>) {
        let alias = alias.unwrap_or_else(|| name.short_name()).to_ascii_lowercase();
        self.imports.insert(alias, name);
    }

    /// Fully qualify a name declared in the current namespace.
    pub fn declare(&self, short: &str) -> ClassName {
        match &self.namespace {
            Some(ns) => ns.join(short),
            None => ClassName::new(short),
        }
    }

    /// Resolve a name used in a class position (`extends`, markers, `::class`).
    pub fn resolve(&self, raw: &str) -> ClassName {
        if raw.starts_with('\\') {
            return ClassName::new(raw);
        }

        if let Some(rest) = raw
            .get(..10)
            .filter(|head| head.eq_ignore_ascii_case("namespace\\"))
            .map(|_| &raw[10..])
        {
            return self.declare(rest);
        }

        let (head, tail) = match raw.split_once('\\') {
            Some((head, tail)) => (head, Some(tail)),
            None => (raw, None),
        };

        match self.imports.get(&head.to_ascii_lowercase()) {
            Some(imported) => match tail {
                Some(tail) => imported.join(tail),
                None => imported.clone(),
            },
            None => self.declare(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_rules() {
        let mut scope = Scope::default();
        scope.enter_namespace(Some("App\\Billing"));
        scope.import(ClassName::new("Discovery\\Attribute\\Auth\\AsPolicy"), None);
        scope.import(ClassName::new("Illuminate\\Database\\Eloquent"), Some("Eloquent"));

        assert_eq!(scope.resolve("AsPolicy").as_str(), "Discovery\\Attribute\\Auth\\AsPolicy");
        assert_eq!(scope.resolve("aspolicy").as_str(), "Discovery\\Attribute\\Auth\\AsPolicy");
        assert_eq!(
            scope.resolve("Eloquent\\Model").as_str(),
            "Illuminate\\Database\\Eloquent\\Model"
        );
        assert_eq!(scope.resolve("\\Foo\\Bar").as_str(), "Foo\\Bar");
        assert_eq!(scope.resolve("Invoice").as_str(), "App\\Billing\\Invoice");
        assert_eq!(scope.resolve("namespace\\Sub\\X").as_str(), "App\\Billing\\Sub\\X");
    }

    #[test]
    fn test_new_namespace_drops_imports() {
        let mut scope = Scope::default();
        scope.enter_namespace(Some("A"));
        scope.import(ClassName::new("Lib\\Thing"), None);
        scope.enter_namespace(None);
        assert_eq!(scope.resolve("Thing").as_str(), "Thing");
        assert_eq!(scope.declare("Foo").as_str(), "Foo");
    }
}
