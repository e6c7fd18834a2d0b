pub mod formatter;

pub use formatter::{
    format_ranking_table, format_record_detail, format_score, format_tsv, should_use_colors,
};
