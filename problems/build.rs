use std::{
    env,
    error::Error,
    fs::{self, File},
    io::{BufWriter, Write},
    path::PathBuf,
    process,
};

/// One row of `problem-codes.csv`.
struct ProblemRow {
    /// Stable code shown to users (for example `Q0101`).
    code: String,
    /// Variant name of the generated enumeration.
    name: String,
    /// Constant message for the category of problem.
    message: String,
}

fn read_rows() -> Result<Vec<ProblemRow>, Box<dyn Error>> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("resources");
    path.push("problem-codes.csv");

    let src = fs::read_to_string(&path)
        .map_err(|e| format!("Unable to read '{}': {}", path.display(), e))?;

    let mut rows = vec![];
    let mut reader = csv::Reader::from_reader(src.as_bytes());
    for record in reader.records() {
        let record = record?;
        let column = |idx: usize| {
            record
                .get(idx)
                .map(|value| value.trim().to_string())
                .ok_or_else(|| format!("Record {:?} has no column {}", record, idx))
        };
        rows.push(ProblemRow {
            code: column(0)?,
            name: column(1)?,
            message: column(2)?,
        });
    }

    Ok(rows)
}

fn write_problems(rows: &[ProblemRow]) -> Result<(), Box<dyn Error>> {
    let mut out_path = PathBuf::from(env::var("OUT_DIR")?);
    fs::create_dir_all(&out_path)
        .map_err(|e| format!("Unable to create output directory: {}", e))?;
    out_path.push("problems.rs");

    let file =
        File::create(out_path).map_err(|e| format!("Unable to create 'problems.rs': {}", e))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]")?;
    writeln!(out, "pub enum Problem {{")?;
    for row in rows {
        writeln!(out, "    {},", row.name)?;
    }
    writeln!(out, "}}\n")?;

    writeln!(out, "impl Problem {{")?;

    writeln!(out, "    /// Returns the stable code for the problem.")?;
    writeln!(out, "    pub fn code(&self) -> &'static str {{")?;
    writeln!(out, "        match self {{")?;
    for row in rows {
        writeln!(out, "            Problem::{} => {:?},", row.name, row.code)?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}\n")?;

    writeln!(out, "    /// Returns the constant message for the category of problem.")?;
    writeln!(out, "    pub fn message(&self) -> &'static str {{")?;
    writeln!(out, "        match self {{")?;
    for row in rows {
        writeln!(out, "            Problem::{} => {:?},", row.name, row.message)?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "    }}\n")?;

    writeln!(out, "    /// Every defined problem, in the order of the definition file.")?;
    writeln!(out, "    pub const ALL: &'static [Problem] = &[")?;
    for row in rows {
        writeln!(out, "        Problem::{},", row.name)?;
    }
    writeln!(out, "    ];")?;

    writeln!(out, "}}")?;
    out.flush()?;

    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=resources/problem-codes.csv");

    let result = read_rows().and_then(|rows| write_problems(&rows));
    if let Err(err) = result {
        println!("problem generating problems.rs: {}", err);
        process::exit(1);
    }
}
