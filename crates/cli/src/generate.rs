use anyhow::{Context, anyhow};
use clap::Subcommand;
use markscope_api::{ClassDescriptor, ClassName};
use markscope_core::{DiscoveryEngine, FinderGenerator, ReadModelDescriptor, ScanReport};
use tabled::{Table, Tabled};

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Print an Eloquent finder implementation for a model
    Finder {
        /// Fully qualified persistence model class
        #[arg(value_name = "MODEL")]
        model: String,
        /// Namespace of the generated finder
        #[arg(long, value_name = "NS")]
        namespace: String,
        /// Comment block placed after the opening tag
        #[arg(long)]
        header: Option<String>,
    },
    /// Print the read-model value class for a model
    ReadModel {
        #[arg(value_name = "MODEL")]
        model: String,
        #[arg(long)]
        header: Option<String>,
    },
    /// Print only the model-to-read-model mapping method
    Mapping {
        #[arg(value_name = "MODEL")]
        model: String,
    },
}

#[derive(Tabled)]
struct DescriptorRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Read Model")]
    read_model: String,
    #[tabled(rename = "Excluded")]
    excluded: String,
    #[tabled(rename = "Renamed")]
    renamed: String,
    #[tabled(rename = "Coerced")]
    coerced: String,
}

impl From<&ReadModelDescriptor> for DescriptorRow {
    fn from(d: &ReadModelDescriptor) -> Self {
        let pairs = |map: &std::collections::BTreeMap<String, String>| {
            map.iter()
                .map(|(k, v)| format!("{k} -> {v}"))
                .collect::<Vec<_>>()
                .join(", ")
        };
        Self {
            model: d.model.to_string(),
            read_model: d.read_model.to_string(),
            excluded: d.config.exclude_fields.join(", "),
            renamed: pairs(&d.config.field_mappings),
            coerced: pairs(&d.config.custom_mappings),
        }
    }
}

pub fn list(engine: &DiscoveryEngine, json: bool) -> anyhow::Result<ScanReport> {
    let discovery = engine.discover_read_models();
    if json {
        let descriptors: Vec<&ReadModelDescriptor> = discovery.output.values().collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
    } else if discovery.output.is_empty() {
        println!("No read models found.");
    } else {
        let rows: Vec<DescriptorRow> = discovery.output.values().map(DescriptorRow::from).collect();
        println!("{}", Table::new(rows));
    }
    Ok(discovery.report)
}

pub fn run(engine: &DiscoveryEngine, cmd: GenerateCommands) -> anyhow::Result<ScanReport> {
    match cmd {
        GenerateCommands::Finder {
            model,
            namespace,
            header,
        } => {
            let (descriptor, class, report) = lookup(engine, &model)?;
            let source = generator(header).generate_finder_class(
                &class,
                &descriptor.read_model,
                &namespace,
                &descriptor.config,
            );
            print!("{}", source);
            Ok(report)
        }
        GenerateCommands::ReadModel { model, header } => {
            let (descriptor, class, report) = lookup(engine, &model)?;
            let source =
                generator(header).generate_read_model_class(&class, &descriptor.read_model, &descriptor.config);
            print!("{}", source);
            Ok(report)
        }
        GenerateCommands::Mapping { model } => {
            let (descriptor, class, report) = lookup(engine, &model)?;
            let source =
                FinderGenerator::new().generate_mapping_method(&class, &descriptor.read_model, &descriptor.config);
            print!("{}", source);
            Ok(report)
        }
    }
}

fn generator(header: Option<String>) -> FinderGenerator {
    match header {
        Some(header) => FinderGenerator::new().with_header(header),
        None => FinderGenerator::new(),
    }
}

fn lookup(
    engine: &DiscoveryEngine,
    model: &str,
) -> anyhow::Result<(ReadModelDescriptor, ClassDescriptor, ScanReport)> {
    let name = ClassName::new(model);
    let discovery = engine.discover_read_models();
    let descriptor = discovery
        .output
        .get(&name)
        .cloned()
        .ok_or_else(|| anyhow!("{} is not a persistence model with a read-model marker", name))?;
    let class = engine
        .reflect_model(&descriptor.model)
        .with_context(|| format!("failed to read {}", descriptor.model))?;
    Ok((descriptor, class, discovery.report))
}
