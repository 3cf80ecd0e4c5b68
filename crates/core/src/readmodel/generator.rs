//! Source text for finder and read-model classes.
//!
//! Output is best-effort text: nothing here checks that the configuration is
//! consistent or that the result compiles.

use super::ReadModelConfig;
use super::properties::{CREATED_AT, FieldType, ID_FIELD, ModelPropertySet, PropertySpec, UPDATED_AT};
use markscope_api::{ClassDescriptor, ClassName};

const DELETED_AT: &str = "deleted_at";
const INDENT: &str = "    ";

/// One read-model field after exclusion and renaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    /// Field on the persistence model.
    pub source: String,
    /// Constructor parameter on the read model.
    pub target: String,
    pub spec: PropertySpec,
    pub expression: String,
}

#[derive(Debug, Clone, Default)]
pub struct FinderGenerator {
    header: Option<String>,
}

impl FinderGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text placed after the opening tag of every generated file, e.g. a
    /// license block.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Value expression reading `field` from `param` (including the `$`).
    pub fn field_expression(field: &str, param: &str, custom_type: Option<&str>) -> String {
        let read = format!("{}->{}", param, field);
        match field {
            ID_FIELD => format!("(string) {}", read),
            CREATED_AT | UPDATED_AT | DELETED_AT => read,
            _ => match custom_type {
                Some("int" | "integer") => format!("(int) {}", read),
                Some("float" | "double") => format!("(float) {}", read),
                Some("bool" | "boolean") => format!("(bool) {}", read),
                Some("array") => format!("{} ?? []", read),
                Some("string") => format!("{} ?? ''", read),
                _ => read,
            },
        }
    }

    /// Model properties minus exclusions, renamed, in property-set order.
    pub fn mapped_fields(model: &ClassDescriptor, config: &ReadModelConfig) -> Vec<MappedField> {
        let schema = model.model.clone().unwrap_or_default();
        let properties = ModelPropertySet::from_schema(&schema);
        let param = model_param(&model.name);

        properties
            .iter()
            .filter(|(field, _)| !config.excludes(field))
            .map(|(field, spec)| {
                let custom = config.custom_mappings.get(field).map(String::as_str);
                let mut spec = *spec;
                if let Some(field_type) = custom.and_then(coercion_type) {
                    spec.field_type = field_type;
                }
                MappedField {
                    source: field.to_string(),
                    target: config.target_name(field).to_string(),
                    spec,
                    expression: Self::field_expression(field, &param, custom),
                }
            })
            .collect()
    }

    /// The private `toReadModel` method alone.
    pub fn generate_mapping_method(
        &self,
        model: &ClassDescriptor,
        read_model: &ClassName,
        config: &ReadModelConfig,
    ) -> String {
        let model_short = model_alias(&model.name, read_model);
        let read_model_short = read_model.short_name();
        let fields = Self::mapped_fields(model, config);

        let construction = if fields.is_empty() {
            format!("new {}()", read_model_short)
        } else {
            let args: String = fields
                .iter()
                .map(|f| format!("{0}{0}{0}{1}: {2},\n", INDENT, f.target, f.expression))
                .collect();
            format!("new {}(\n{}{}{})", read_model_short, args, INDENT, INDENT)
        };

        format!(
            "{i}private static function toReadModel({model} {param}): {rm}\n\
             {i}{{\n\
             {i}{i}return {construction};\n\
             {i}}}\n",
            i = INDENT,
            model = model_short,
            param = model_param(&model.name),
            rm = read_model_short,
            construction = construction,
        )
    }

    /// An Eloquent finder for `read_model` in `finder_namespace`, implementing
    /// the matching interface from the application layer.
    pub fn generate_finder_class(
        &self,
        model: &ClassDescriptor,
        read_model: &ClassName,
        finder_namespace: &str,
        config: &ReadModelConfig,
    ) -> String {
        let finder_namespace = finder_namespace.trim_matches('\\');
        let read_model_short = read_model.short_name();
        let model_short = model_alias(&model.name, read_model);
        let interface = finder_interface(finder_namespace, read_model);

        let model_import = if model_short == model.name.short_name() {
            format!("use {};", model.name)
        } else {
            format!("use {} as {};", model.name, model_short)
        };

        let mut out = self.preamble();
        out.push_str(&format!("namespace {};\n\n", finder_namespace));
        out.push_str(&format!("{}\nuse {};\nuse {};\n\n", model_import, read_model, interface));
        out.push_str(&format!(
            "final class Eloquent{rm}Finder implements {iface}\n{{\n",
            rm = read_model_short,
            iface = interface.short_name(),
        ));
        out.push_str(&format!(
            "{i}public function find(string $id): ?{rm}\n\
             {i}{{\n\
             {i}{i}$model = {m}::find($id);\n\
             \n\
             {i}{i}return $model ? self::toReadModel($model) : null;\n\
             {i}}}\n\
             \n\
             {i}public function search(array $criteria): array\n\
             {i}{{\n\
             {i}{i}$models = {m}::where($criteria)->get();\n\
             \n\
             {i}{i}return $models->map(fn ($model) => self::toReadModel($model))->toArray();\n\
             {i}}}\n\
             \n\
             {i}public function count(array $criteria = []): int\n\
             {i}{{\n\
             {i}{i}return {m}::where($criteria)->count();\n\
             {i}}}\n\
             \n",
            i = INDENT,
            rm = read_model_short,
            m = model_short,
        ));
        out.push_str(&self.generate_mapping_method(model, read_model, config));
        out.push_str("}\n");
        out
    }

    /// A readonly value class with one promoted constructor parameter per
    /// mapped field.
    pub fn generate_read_model_class(
        &self,
        model: &ClassDescriptor,
        read_model: &ClassName,
        config: &ReadModelConfig,
    ) -> String {
        let fields = Self::mapped_fields(model, config);

        let mut out = self.preamble();
        if let Some(namespace) = read_model.namespace() {
            out.push_str(&format!("namespace {};\n\n", namespace));
        }
        if fields.iter().any(|f| f.spec.field_type == FieldType::Timestamp) {
            out.push_str("use Carbon\\CarbonInterface;\n\n");
        }

        out.push_str(&format!("final readonly class {}\n{{\n", read_model.short_name()));
        if fields.is_empty() {
            out.push_str(&format!("{}public function __construct() {{}}\n", INDENT));
        } else {
            out.push_str(&format!("{}public function __construct(\n", INDENT));
            for field in &fields {
                let nullable = if field.spec.nullable { "?" } else { "" };
                out.push_str(&format!(
                    "{i}{i}public {n}{ty} ${name},\n",
                    i = INDENT,
                    n = nullable,
                    ty = field.spec.field_type.source_type(),
                    name = field.target,
                ));
            }
            out.push_str(&format!("{}) {{}}\n", INDENT));
        }
        out.push_str("}\n");
        out
    }

    fn preamble(&self) -> String {
        let mut out = String::from("<?php declare(strict_types=1);\n\n");
        if let Some(header) = &self.header {
            out.push_str(header.trim_end());
            out.push_str("\n\n");
        }
        out
    }
}

fn coercion_type(custom: &str) -> Option<FieldType> {
    match custom {
        "int" | "integer" => Some(FieldType::Int),
        "float" | "double" => Some(FieldType::Float),
        "bool" | "boolean" => Some(FieldType::Bool),
        "array" => Some(FieldType::Array),
        "string" => Some(FieldType::String),
        _ => None,
    }
}

/// `$invoice` for `App\Model\Invoice`.
fn model_param(model: &ClassName) -> String {
    let short = model.short_name();
    let mut chars = short.chars();
    match chars.next() {
        Some(first) => format!("${}{}", first.to_lowercase(), chars.as_str()),
        None => "$model".to_string(),
    }
}

/// Short name the model is imported under; suffixed when it would clash
/// with the read model's.
fn model_alias(model: &ClassName, read_model: &ClassName) -> String {
    if model.short_name() == read_model.short_name() {
        format!("{}Model", model.short_name())
    } else {
        model.short_name().to_string()
    }
}

fn finder_interface(finder_namespace: &str, read_model: &ClassName) -> ClassName {
    let wrapped = format!("\\{}\\", finder_namespace);
    let namespace = wrapped.replace("\\Infrastructure\\", "\\Application\\");
    ClassName::new(format!(
        "{}{}FinderInterface",
        namespace.trim_start_matches('\\'),
        read_model.short_name()
    ))
}
