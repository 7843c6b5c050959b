use std::{
    env,
    error::Error,
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    process,
};

use dawgdict::{Builder, Dawg, DawgError};
use tqdm::tqdm;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: builder <infile> <outfile>");
        process::exit(2);
    }

    let dawg = match compile(&args[1]) {
        Err(e) => {
            eprintln!("could not build dictionary from {}: {}", &args[1], e);
            process::exit(1);
        }
        Ok(dawg) => dawg,
    };

    if let Err(e) = write_dawg(&dawg, &args[2]) {
        eprintln!("could not write {}: {}", &args[2], e);
        process::exit(1);
    }
}

fn compile(file_name: &str) -> Result<Dawg, Box<dyn Error>> {
    let reader = io::BufReader::new(File::open(file_name)?);
    let mut builder = Builder::new();
    for line in tqdm(reader.lines()) {
        builder.add(line?.trim());
    }
    log::info!(
        "{} words in, {} trie nodes",
        builder.word_count(),
        builder.node_count()
    );

    let dawg = builder.build();
    log::info!("{} nodes after minimization", dawg.node_count());
    Ok(dawg)
}

fn write_dawg(dawg: &Dawg, file_name: &str) -> Result<(), DawgError> {
    let mut writer = BufWriter::new(File::create(file_name)?);
    dawg.store(&mut writer)?;
    writer.flush()?;
    Ok(())
}
