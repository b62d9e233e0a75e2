//! Datacard text writer.
//!
//! One [`DatacardWriter`] owns the output file of one datacard from creation
//! to [`DatacardWriter::finish`]. Sections must be written in document order;
//! calls out of order are rejected with [`Error::Sequence`].

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use dc_core::{Error, Result};

use crate::aggregate::Yields;
use crate::config::GroupConfig;
use crate::taxonomy::UncertaintyKind;

const HEADER_RULE_WIDTH: usize = 118;
const RATE_RULE_WIDTH: usize = 117;

/// Placeholder printed for a missing observation or rate.
pub const MISSING_YIELD: &str = "-999.0";

/// Placeholder for a process a row does not apply to.
pub const NOT_APPLICABLE: &str = "-";

/// Sections of a datacard, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// File created, nothing written.
    Created,
    /// Count lines and `shapes` pointer.
    Header,
    /// Observation, process and rate block.
    Yields,
    /// Systematic table rows.
    Systematics,
    /// Synthesized MC-stat rows.
    McStat,
    /// Group lines.
    Groups,
}

impl Stage {
    /// Earliest stage a writer must have reached before entering `self`.
    fn requires(self) -> Stage {
        match self {
            Stage::Created | Stage::Header => Stage::Created,
            Stage::Yields => Stage::Header,
            Stage::Systematics | Stage::McStat | Stage::Groups => Stage::Yields,
        }
    }

    fn repeatable(self) -> bool {
        matches!(self, Stage::Systematics | Stage::McStat)
    }
}

/// Sequential writer of one datacard file.
pub struct DatacardWriter {
    out: BufWriter<File>,
    path: PathBuf,
    stage: Stage,
    columns: usize,
}

impl DatacardWriter {
    /// Create (truncate) the datacard at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let out = BufWriter::new(File::create(&path)?);
        Ok(Self { out, path, stage: Stage::Created, columns: 0 })
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last section written.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, next: Stage) -> Result<()> {
        let ok = if self.stage == next {
            next.repeatable()
        } else {
            self.stage < next && self.stage >= next.requires()
        };
        if !ok {
            return Err(Error::Sequence(format!(
                "{}: cannot write {:?} section after {:?}",
                self.path.display(),
                next,
                self.stage
            )));
        }
        self.stage = next;
        Ok(())
    }

    /// Count lines and the `shapes` pointer into the archive.
    pub fn write_header(&mut self, archive_file_name: &str, observable: &str) -> Result<()> {
        self.enter(Stage::Header)?;
        let rule = "-".repeat(HEADER_RULE_WIDTH);
        writeln!(self.out, "imax\t*\tnumber of categories")?;
        writeln!(self.out, "jmax\t*\tnumber of samples minus one")?;
        writeln!(self.out, "kmax\t*\tnumber of nuisance parameter")?;
        writeln!(self.out, "{}", rule)?;
        writeln!(
            self.out,
            "\nshapes * * {}\t$CHANNEL_{obs}/$PROCESS\t$CHANNEL_{obs}/$PROCESS_$SYSTEMATIC",
            archive_file_name,
            obs = observable
        )?;
        writeln!(self.out, "{}", rule)?;
        Ok(())
    }

    /// Observation, process and rate block followed by the source comment line.
    pub fn write_yields(&mut self, category_label: &str, yields: &Yields) -> Result<()> {
        self.enter(Stage::Yields)?;
        self.columns = yields.rates.len();

        writeln!(self.out, "\nbin\t\t{}", category_label)?;
        match yields.observation {
            Some(v) => writeln!(self.out, "observation\t{:.6}\t", v)?,
            None => writeln!(self.out, "observation\t{}\t", MISSING_YIELD)?,
        }
        writeln!(self.out, "{}", "-".repeat(HEADER_RULE_WIDTH))?;

        write!(self.out, "\nbin\t")?;
        for _ in &yields.rates {
            write!(self.out, "{:<8}\t", category_label)?;
        }
        write!(self.out, "\nprocess\t")?;
        for r in &yields.rates {
            write!(self.out, "{:<8}\t", r.label)?;
        }
        write!(self.out, "\nprocess\t")?;
        for k in 1..=yields.rates.len() {
            write!(self.out, "{:<8}\t", k as i64 - yields.n_signal as i64)?;
        }
        write!(self.out, "\nrate\t")?;
        for r in &yields.rates {
            match r.rate {
                Some(v) => write!(self.out, "{:.6}\t", v)?,
                None => write!(self.out, "{}\t", MISSING_YIELD)?,
            }
        }
        writeln!(self.out, "\n{}", "-".repeat(RATE_RULE_WIDTH))?;

        write!(self.out, "#Source of uncertainty\t\t pdf\t\t")?;
        for r in &yields.rates {
            write!(self.out, "{:<8}\t", r.label)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn check_columns(&self, row: &str, n: usize) -> Result<()> {
        if n != self.columns {
            return Err(Error::Validation(format!(
                "row '{}' has {} values for {} processes",
                row, n, self.columns
            )));
        }
        Ok(())
    }

    fn write_values(&mut self, values: &[Option<&str>]) -> Result<()> {
        for v in values {
            write!(self.out, "{:<8.11}\t", v.unwrap_or(NOT_APPLICABLE))?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    /// One systematic row; `values` holds one entry per rate column.
    pub fn write_systematic_row(
        &mut self,
        label: &str,
        kind: UncertaintyKind,
        values: &[Option<&str>],
    ) -> Result<()> {
        self.check_columns(label, values.len())?;
        self.enter(Stage::Systematics)?;
        write!(self.out, "{:<32} {}\t\t", label, kind.as_str())?;
        self.write_values(values)
    }

    /// One synthesized MC-stat shape row.
    pub fn write_mc_stat_row(&mut self, name: &str, values: &[Option<&str>]) -> Result<()> {
        self.check_columns(name, values.len())?;
        self.enter(Stage::McStat)?;
        write!(self.out, "{:<32} shape\t", name)?;
        self.write_values(values)
    }

    /// `<name> group = <members>` lines, preceded by a blank line.
    pub fn write_groups(&mut self, groups: &[GroupConfig]) -> Result<()> {
        self.enter(Stage::Groups)?;
        if groups.is_empty() {
            return Ok(());
        }
        writeln!(self.out, "\n")?;
        for g in groups {
            writeln!(self.out, "{} group = {}", g.name, g.members.join(" "))?;
        }
        Ok(())
    }

    /// Flush and close; the yields block must have been written.
    pub fn finish(mut self) -> Result<PathBuf> {
        if self.stage < Stage::Yields {
            return Err(Error::Sequence(format!(
                "{}: closed before the yields block was written",
                self.path.display()
            )));
        }
        self.out.flush()?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ProcessYield;

    fn tmp_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("dc_card_writer_{}_{}_{}.txt", name, std::process::id(), nanos))
    }

    fn yields() -> Yields {
        Yields {
            observation: Some(12.5),
            rates: vec![
                ProcessYield { process: "ttH".into(), label: "ttH".into(), rate: Some(1.25) },
                ProcessYield { process: "ttbb".into(), label: "ttbarPlusBBbar".into(), rate: None },
            ],
            n_signal: 1,
        }
    }

    #[test]
    fn full_document_layout() {
        let path = tmp_path("layout");
        let mut w = DatacardWriter::create(&path).unwrap();
        w.write_header("common/shapes.dcar", "BDT").unwrap();
        w.write_yields("dl_3j2t", &yields()).unwrap();
        w.write_systematic_row("lumi_13TeV_2016", UncertaintyKind::Rate, &[Some("1.025000"), Some("1.025000")])
            .unwrap();
        w.write_mc_stat_row("CMS_ttH_ttH_dl_3j2t_13TeV_BDTbin1", &[Some("1.000000"), None]).unwrap();
        w.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let rule = "-".repeat(118);
        let expected = format!(
            "imax\t*\tnumber of categories\n\
             jmax\t*\tnumber of samples minus one\n\
             kmax\t*\tnumber of nuisance parameter\n\
             {rule}\n\
             \nshapes * * common/shapes.dcar\t$CHANNEL_BDT/$PROCESS\t$CHANNEL_BDT/$PROCESS_$SYSTEMATIC\n\
             {rule}\n\
             \nbin\t\tdl_3j2t\n\
             observation\t12.500000\t\n\
             {rule}\n\
             \nbin\tdl_3j2t \tdl_3j2t \t\
             \nprocess\tttH     \tttbarPlusBBbar\t\
             \nprocess\t0       \t1       \t\
             \nrate\t1.250000\t-999.0\t\n\
             {short}\n\
             #Source of uncertainty\t\t pdf\t\tttH     \tttbarPlusBBbar\t\n\
             {lumi:<32} lnN\t\t1.025000\t1.025000\t\n\
             {mc:<32} shape\t1.000000\t-       \t\n",
            rule = rule,
            short = "-".repeat(117),
            lumi = "lumi_13TeV_2016",
            mc = "CMS_ttH_ttH_dl_3j2t_13TeV_BDTbin1",
        );
        assert_eq!(text, expected);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn long_values_are_truncated_to_eleven_chars() {
        let path = tmp_path("trunc");
        let mut w = DatacardWriter::create(&path).unwrap();
        w.write_header("a.dcar", "BDT").unwrap();
        w.write_yields("dl_3j2t", &yields()).unwrap();
        w.write_systematic_row("x", UncertaintyKind::Rate, &[Some("0.123456789012345"), None]).unwrap();
        w.finish().unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("lnN\t\t0.123456789\t-       \t\n"), "{}", text);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn out_of_order_sections_are_rejected() {
        let path = tmp_path("order");
        let mut w = DatacardWriter::create(&path).unwrap();
        let err = w.write_yields("dl_3j2t", &yields()).unwrap_err();
        assert!(matches!(err, Error::Sequence(_)), "{:?}", err);

        w.write_header("a.dcar", "BDT").unwrap();
        assert!(matches!(w.write_header("a.dcar", "BDT"), Err(Error::Sequence(_))));
        assert!(matches!(w.write_mc_stat_row("n", &[]), Err(Error::Sequence(_)) | Err(Error::Validation(_))));
        w.write_yields("dl_3j2t", &yields()).unwrap();
        w.write_mc_stat_row("n", &[None, None]).unwrap();
        let err = w.write_systematic_row("late", UncertaintyKind::Shape, &[None, None]).unwrap_err();
        assert!(matches!(err, Error::Sequence(_)), "{:?}", err);
        w.write_groups(&[]).unwrap();
        assert!(matches!(w.write_mc_stat_row("n", &[None, None]), Err(Error::Sequence(_))));
        w.finish().unwrap();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn finish_requires_yields() {
        let path = tmp_path("early");
        let mut w = DatacardWriter::create(&path).unwrap();
        w.write_header("a.dcar", "BDT").unwrap();
        assert!(matches!(w.finish(), Err(Error::Sequence(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn group_lines() {
        let path = tmp_path("groups");
        let mut w = DatacardWriter::create(&path).unwrap();
        w.write_header("a.dcar", "BDT").unwrap();
        w.write_yields("dl_3j2t", &yields()).unwrap();
        let groups = vec![GroupConfig { name: "btag".into(), members: vec!["CMS_btag_lf".into(), "CMS_btag_hf".into()] }];
        w.write_groups(&groups).unwrap();
        w.finish().unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("\n\n\nbtag group = CMS_btag_lf CMS_btag_hf\n"), "{:?}", text);
        std::fs::remove_file(&path).ok();
    }
}
