use std::io::{self, BufRead, Write};

/// The only gap symbol recognized in alignment texts.
pub const GAP: u8 = b'-';

#[derive(Debug, Clone, Default)]
pub struct MafComp {
    pub src: String,
    pub start: usize, // 0-based, in strand coordinates as written in the s line
    pub size: usize,  // ungapped length of text
    pub strand: char,
    pub src_size: usize,
    pub text: String,
}

impl MafComp {
    pub fn seq(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn has_gaps(&self) -> bool {
        self.seq().contains(&GAP)
    }

    pub fn gap_count(&self) -> usize {
        self.seq().iter().filter(|&&c| c == GAP).count()
    }

    /// Positive-strand start of this row's ungapped chunk.
    ///
    /// MAF starts are strand-local; a `-` row counts from the end of the
    /// source sequence.
    pub fn positive_start(&self) -> usize {
        if self.strand == '-' {
            self.src_size - self.start - self.size
        } else {
            self.start
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MafAli {
    pub score: Option<f64>,
    pub components: Vec<MafComp>,
}

impl MafAli {
    pub fn num_rows(&self) -> usize {
        self.components.len()
    }

    pub fn num_cols(&self) -> usize {
        self.components.first().map_or(0, |c| c.text.len())
    }
}

pub struct MafReader<R> {
    reader: std::io::BufReader<R>,
    line_buf: String,
}

impl<R: std::io::Read> MafReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: std::io::BufReader::new(inner),
            line_buf: String::new(),
        }
    }

    fn read_line(&mut self) -> std::io::Result<usize> {
        self.line_buf.clear();
        self.reader.read_line(&mut self.line_buf)
    }
}

fn parse_s_line(line: &str) -> anyhow::Result<MafComp> {
    // Format: s src start size strand srcSize text
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 7 {
        return Err(anyhow::anyhow!("Invalid MAF s line: {}", line));
    }

    let src = parts[1].to_string();
    let start: usize = parts[2]
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid start in s line: {}", parts[2]))?;
    let size: usize = parts[3]
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size in s line: {}", parts[3]))?;
    let strand = match parts[4] {
        "+" => '+',
        "-" => '-',
        other => return Err(anyhow::anyhow!("Invalid strand in s line: {}", other)),
    };
    let src_size: usize = parts[5]
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid srcSize in s line: {}", parts[5]))?;
    let text = parts[6].to_string();

    let comp = MafComp {
        src,
        start,
        size,
        strand,
        src_size,
        text,
    };

    let non_gap = comp.text.len() - comp.gap_count();
    if non_gap != comp.size {
        return Err(anyhow::anyhow!(
            "s line of {} declares size {} but text holds {} bases",
            comp.src,
            comp.size,
            non_gap
        ));
    }
    if comp.start + comp.size > comp.src_size {
        return Err(anyhow::anyhow!(
            "s line of {} extends past srcSize {}",
            comp.src,
            comp.src_size
        ));
    }

    Ok(comp)
}

impl<R: std::io::Read> Iterator for MafReader<R> {
    type Item = anyhow::Result<MafAli>;

    fn next(&mut self) -> Option<Self::Item> {
        // Seek the next a line
        let mut ali = loop {
            match self.read_line() {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    let line = self.line_buf.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if line.split_whitespace().next() != Some("a") {
                        continue;
                    }

                    // Parse "a score=23262.0" style key=value fields
                    let mut ali = MafAli::default();
                    for field in line.split_whitespace().skip(1) {
                        if let Some(value) = field.strip_prefix("score=") {
                            ali.score = value.parse().ok();
                        }
                    }
                    break ali;
                }
                Err(e) => return Some(Err(anyhow::Error::new(e))),
            }
        };

        // Collect s lines until the blank separator
        loop {
            match self.read_line() {
                Ok(0) => break, // EOF closes the block
                Ok(_) => {
                    let line = self.line_buf.trim();
                    if line.is_empty() {
                        break;
                    }
                    if line.split_whitespace().next() == Some("s") {
                        match parse_s_line(line) {
                            Ok(comp) => ali.components.push(comp),
                            Err(e) => return Some(Err(e)),
                        }
                    }
                    // i, e and q lines carry annotations this tool ignores
                }
                Err(e) => return Some(Err(anyhow::Error::new(e))),
            }
        }

        if ali.components.is_empty() {
            return Some(Err(anyhow::anyhow!("Alignment block without s lines")));
        }
        let num_cols = ali.num_cols();
        for comp in &ali.components {
            if comp.text.len() != num_cols {
                return Some(Err(anyhow::anyhow!(
                    "Ragged block: {} has {} columns, expected {}",
                    comp.src,
                    comp.text.len(),
                    num_cols
                )));
            }
        }

        Some(Ok(ali))
    }
}

pub struct MafWriter<W: Write> {
    writer: W,
}

impl<W: Write> MafWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_header(&mut self, program: &str) -> io::Result<()> {
        writeln!(self.writer, "##maf version=1 scoring={}", program)
    }

    pub fn write_ali(&mut self, ali: &MafAli) -> io::Result<()> {
        writeln!(self.writer, "a score={:.1}", ali.score.unwrap_or(0.0))?;
        for comp in &ali.components {
            writeln!(
                self.writer,
                "s {:<20} {:10} {:10} {} {:10} {}",
                comp.src, comp.start, comp.size, comp.strand, comp.src_size, comp.text
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}
