use crate::cli::CompileArgs;
use tablegate::{Ident, QueryParams, classify, compile_count, compile_select};

pub fn run(args: CompileArgs) -> anyhow::Result<()> {
    print!("{}", render(&args)?);
    Ok(())
}

/// The SQL, its JSON-encoded arguments, and one comment line per ignored
/// parameter.
fn render(args: &CompileArgs) -> anyhow::Result<String> {
    let table = Ident::parse(&args.table)?;
    let mut params = QueryParams::parse(&args.query);
    let count = params.take_count_flag() || args.count;

    let classified = classify(&params);
    let query = if count {
        compile_count(&classified.spec, table.as_str())
    } else {
        compile_select(&classified.spec, table.as_str())
    };

    let mut out = format!("{}\n", query.sql);
    out.push_str(&format!("-- args: {}\n", serde_json::to_string(&query.args)?));
    for ignored in &classified.ignored {
        out.push_str(&format!("-- ignored: {} ({})\n", ignored.key, ignored.reason));
    }
    Ok(out)
}
