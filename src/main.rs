use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hier_index::config::Config;
use hier_index::query::create_filter;
use hier_index::source::JsonFileSource;
use hier_index::storage::delete_cache_for_variants;
use hier_index::{FieldValue, Hierarchy, HierarchyList, Item, Node};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hier-index", version, about = "Materialized hierarchy lists with field indices")]
struct Cli {
    /// TOML 配置文件（缺省使用内置默认值）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 记录来源：JSON 对象数组
    #[arg(long, global = true)]
    records: Option<PathBuf>,

    /// 覆盖配置中的缓存变体（如语言）
    #[arg(long, global = true)]
    variant: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 强制从来源重建并回写缓存
    Build,
    /// 以缩进树形式打印
    Show,
    /// 打印统计报告
    Stats,
    /// 查找单个节点
    Item(Lookup),
    /// 子节点查询
    Children {
        #[command(flatten)]
        lookup: Lookup,
        /// 只返回直接子节点
        #[arg(long)]
        first_level: bool,
        /// 结果包含节点本身
        #[arg(long, conflicts_with = "first_level")]
        with_item: bool,
    },
    /// 祖先链（由近及远）
    Parents {
        #[command(flatten)]
        lookup: Lookup,
        /// 结果包含节点本身
        #[arg(long)]
        with_item: bool,
    },
    /// 按字段过滤（未命中节点整棵子树剔除）
    Filter {
        field: String,
        /// 相等值、通配符（* ?）或 `re:<regex>`
        pattern: String,
    },
    /// 删除缓存
    ClearCache {
        /// 要删除的变体列表；为空时删除当前 key
        #[arg(long = "all-variants", value_delimiter = ',')]
        variants: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
struct Lookup {
    /// 查找值（能解析为整数时按整数匹配）
    value: String,
    /// 查找字段，缺省为 id 字段
    #[arg(long)]
    field: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };
    if cli.variant.is_some() {
        cfg.cache.variant = cli.variant.clone();
    }

    let records = cli
        .records
        .clone()
        .unwrap_or_else(|| PathBuf::from("records.json"));
    let list = HierarchyList::new(
        cfg.schema.clone(),
        cfg.cache.key(),
        Box::new(JsonFileSource::new(records)),
        cfg.cache.build::<Item>(),
    );
    let level_field = cfg.schema.level_field.as_str();

    match cli.command {
        Command::Build => {
            let h = list.load_from_source()?;
            info!("Rebuilt {} ({} nodes)", list.key(), h.len());
            println!("{}", h.stats());
        }
        Command::Show => {
            let h = list.init()?;
            for node in h.nodes() {
                println!("{}{}", "  ".repeat(node.level as usize), label(&h, node));
            }
        }
        Command::Stats => {
            println!("{}", list.init()?.stats());
        }
        Command::Item(lookup) => {
            let h = list.init()?;
            let (value, field) = lookup.resolve(&h)?;
            if let Some(node) = h.get_item(&value, field)? {
                print_nodes(std::iter::once(node), level_field)?;
            }
        }
        Command::Children {
            lookup,
            first_level,
            with_item,
        } => {
            let h = list.init()?;
            let (value, field) = lookup.resolve(&h)?;
            if first_level {
                if let Some(nodes) = h.get_children_first_level(&value, field)? {
                    print_nodes(nodes.into_iter(), level_field)?;
                }
            } else {
                let found = if with_item {
                    h.get_item_with_children(&value, field)?
                } else {
                    h.get_children(&value, field)?
                };
                if let Some(nodes) = found {
                    print_nodes(nodes.iter(), level_field)?;
                }
            }
        }
        Command::Parents { lookup, with_item } => {
            let h = list.init()?;
            let (value, field) = lookup.resolve(&h)?;
            let chain = if with_item {
                h.get_item_with_parents(&value, field)?
            } else {
                h.get_parents(&value, field)?
            };
            print_nodes(chain.into_iter(), level_field)?;
        }
        Command::Filter { field, pattern } => {
            let h = list.init()?;
            let filter = create_filter(&field, &pattern)?;
            print_nodes(h.get_all_items_by_predicate(&filter).into_iter(), level_field)?;
        }
        Command::ClearCache { variants } => {
            if variants.is_empty() {
                list.delete_cache()?;
            } else {
                let cache = cfg.cache.build::<Item>();
                delete_cache_for_variants(cache.as_ref(), &cfg.cache.name, &variants)?;
                info!("Deleted {} cache variants of {}", variants.len(), cfg.cache.name);
            }
        }
    }

    Ok(())
}

impl Lookup {
    fn resolve<'a>(&'a self, h: &'a Hierarchy<Item>) -> anyhow::Result<(FieldValue, &'a str)> {
        let field = self
            .field
            .as_deref()
            .unwrap_or(h.schema().id_field.as_str());
        Ok((h.resolve_value(&self.value, field)?, field))
    }
}

fn label(h: &Hierarchy<Item>, node: &Node<Item>) -> String {
    let id = node
        .record
        .get(&h.schema().id_field)
        .map(|v| v.to_string())
        .unwrap_or_default();
    // 优先展示第一个额外查找字段（通常是 alias / title）
    match h
        .schema()
        .lookup_fields
        .iter()
        .find(|f| **f != h.schema().id_field)
        .and_then(|f| node.record.get(f))
    {
        Some(extra) => format!("{} ({})", id, extra),
        None => id,
    }
}

fn print_nodes<'a>(
    nodes: impl Iterator<Item = &'a Node<Item>>,
    level_field: &str,
) -> anyhow::Result<()> {
    for node in nodes {
        println!("{}", serde_json::to_string(&node.to_json(level_field))?);
    }
    Ok(())
}
