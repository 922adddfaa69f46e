use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::vacancy::{compare_by_salary, Vacancy};
use crate::utils::validation::field_error;

/// Exact-match filter over storage field names, ANDed together.
///
/// An empty set of criteria matches every record. A field name the record
/// doesn't have never matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    fields: BTreeMap<String, Value>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn matches(&self, vacancy: &Vacancy) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| vacancy.field_value(field).as_ref() == Some(expected))
    }
}

/// Vacancy collection persisted as a single JSON array.
///
/// Every operation reads the whole file. Mutations run as one transaction
/// under the write lock and replace the file through a rename, so readers
/// see either the old or the new array.
#[derive(Clone)]
pub struct VacancyStore {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl VacancyStore {
    /// Opens the store at `path`, creating the file (and its parent
    /// directories) with an empty array when it does not exist yet.
    pub async fn initialize(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !fs::try_exists(&path).await? {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, b"[]").await?;
            info!(path = %path.display(), "Created empty vacancy store");
        }

        Ok(Self {
            path,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<Vacancy>> {
        let bytes = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn persist(&self, vacancies: &[Vacancy]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(vacancies)?;
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(err) = replace_file(&tmp, &self.path, &bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn read<T>(&self, f: impl FnOnce(Vec<Vacancy>) -> T) -> Result<T> {
        let _guard = self.lock.read().await;
        let vacancies = self.load().await?;
        Ok(f(vacancies))
    }

    async fn transaction<T>(&self, f: impl FnOnce(&mut Vec<Vacancy>) -> T) -> Result<T> {
        let _guard = self.lock.write().await;
        let mut vacancies = self.load().await?;
        let out = f(&mut vacancies);
        self.persist(&vacancies).await?;
        info!(count = vacancies.len(), "Vacancy store updated");
        Ok(out)
    }

    #[instrument(skip_all, fields(title = %vacancy.title()))]
    pub async fn add(&self, vacancy: &Vacancy) -> Result<()> {
        self.transaction(|all| all.push(vacancy.clone())).await
    }

    /// Appends a batch in a single write. Returns the number appended.
    #[instrument(skip_all, fields(count = vacancies.len()))]
    pub async fn add_many(&self, vacancies: &[Vacancy]) -> Result<usize> {
        self.transaction(|all| {
            all.extend_from_slice(vacancies);
            vacancies.len()
        })
        .await
    }

    pub async fn query(&self, criteria: &Criteria) -> Result<Vec<Vacancy>> {
        self.read(|all| all.into_iter().filter(|v| criteria.matches(v)).collect())
            .await
    }

    /// Stable: records with equal salary keep their stored order.
    pub async fn sorted_by_salary(&self, descending: bool) -> Result<Vec<Vacancy>> {
        self.read(|mut all| {
            if descending {
                all.sort_by(|a, b| compare_by_salary(b, a));
            } else {
                all.sort_by(compare_by_salary);
            }
            all
        })
        .await
    }

    pub async fn top_n(&self, n: usize) -> Result<Vec<Vacancy>> {
        if n == 0 {
            return Err(field_error("n", "range", "n must be a positive integer").into());
        }
        let mut sorted = self.sorted_by_salary(true).await?;
        sorted.truncate(n);
        Ok(sorted)
    }

    /// Removes every record matching `criteria` and returns what is left.
    /// Empty criteria clear the store.
    #[instrument(skip(self))]
    pub async fn delete(&self, criteria: &Criteria) -> Result<Vec<Vacancy>> {
        self.transaction(|all| {
            all.retain(|v| !criteria.matches(v));
            all.clone()
        })
        .await
    }
}

/// Writes `bytes` to `tmp`, syncs it, then renames it over `path`.
async fn replace_file(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::vacancy::NewVacancy;
    use tempfile::tempdir;

    fn vacancy(title: &str, city: &str, salary: i64) -> Vacancy {
        Vacancy::new(
            NewVacancy::new(title, format!("https://hh.ru/vacancy/{title}"))
                .city(city)
                .salary(salary)
                .currency("RUR")
                .description(format!("{title} in {city}")),
        )
        .unwrap()
    }

    async fn store_with(dir: &Path, items: &[Vacancy]) -> VacancyStore {
        let store = VacancyStore::initialize(dir.join("vacancies.json"))
            .await
            .unwrap();
        for item in items {
            store.add(item).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn initialize_creates_empty_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("vacancies.json");
        let store = VacancyStore::initialize(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
        assert!(store.query(&Criteria::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn initialize_keeps_existing_records() {
        let dir = tempdir().unwrap();
        let first = store_with(dir.path(), &[vacancy("a", "Moscow", 10)]).await;
        let reopened = VacancyStore::initialize(first.path()).await.unwrap();
        assert_eq!(reopened.query(&Criteria::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_then_query_round_trips_in_insertion_order() {
        let dir = tempdir().unwrap();
        let items = vec![
            vacancy("a", "Moscow", 300),
            vacancy("b", "Kazan", 100),
            vacancy("c", "Moscow", 200),
        ];
        let store = store_with(dir.path(), &items).await;

        let all = store.query(&Criteria::new()).await.unwrap();
        assert_eq!(all, items);
        assert_eq!(store.query(&Criteria::new()).await.unwrap(), all);
    }

    #[tokio::test]
    async fn query_ands_criteria() {
        let dir = tempdir().unwrap();
        let store = store_with(
            dir.path(),
            &[
                vacancy("a", "Moscow", 300),
                vacancy("b", "Kazan", 300),
                vacancy("c", "Moscow", 200),
            ],
        )
        .await;

        let moscow = store
            .query(&Criteria::new().with("city", "Moscow"))
            .await
            .unwrap();
        assert_eq!(moscow.len(), 2);

        let both = store
            .query(&Criteria::new().with("city", "Moscow").with("salary", 300))
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].title(), "a");

        let unknown = store
            .query(&Criteria::new().with("company", "Acme"))
            .await
            .unwrap();
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn sorts_by_salary_both_ways() {
        let dir = tempdir().unwrap();
        let store = store_with(
            dir.path(),
            &[
                vacancy("zero", "Moscow", 0),
                vacancy("high", "Moscow", 500),
                vacancy("mid", "Moscow", 200),
            ],
        )
        .await;

        let salaries = |v: Vec<Vacancy>| v.iter().map(Vacancy::salary).collect::<Vec<_>>();
        assert_eq!(
            salaries(store.sorted_by_salary(true).await.unwrap()),
            vec![500, 200, 0]
        );
        assert_eq!(
            salaries(store.sorted_by_salary(false).await.unwrap()),
            vec![0, 200, 500]
        );
    }

    #[tokio::test]
    async fn sort_keeps_stored_order_for_equal_salaries() {
        let dir = tempdir().unwrap();
        let store = store_with(
            dir.path(),
            &[
                vacancy("first", "Moscow", 100),
                vacancy("top", "Moscow", 900),
                vacancy("second", "Kazan", 100),
            ],
        )
        .await;

        let titles = |v: Vec<Vacancy>| v.iter().map(|x| x.title().to_string()).collect::<Vec<_>>();
        let descending = store.sorted_by_salary(true).await.unwrap();
        assert_eq!(store.sorted_by_salary(true).await.unwrap(), descending);
        assert_eq!(titles(descending), ["top", "first", "second"]);
        assert_eq!(
            titles(store.sorted_by_salary(false).await.unwrap()),
            ["first", "second", "top"]
        );
    }

    #[tokio::test]
    async fn top_n_takes_highest_and_rejects_zero() {
        let dir = tempdir().unwrap();
        let store = store_with(
            dir.path(),
            &[
                vacancy("a", "Moscow", 100),
                vacancy("b", "Moscow", 300),
                vacancy("c", "Moscow", 200),
            ],
        )
        .await;

        let top = store.top_n(2).await.unwrap();
        assert_eq!(top.iter().map(Vacancy::salary).collect::<Vec<_>>(), vec![300, 200]);
        assert_eq!(store.top_n(10).await.unwrap().len(), 3);
        assert!(store.top_n(0).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn delete_returns_remaining_records() {
        let dir = tempdir().unwrap();
        let store = store_with(
            dir.path(),
            &[
                vacancy("a", "Moscow", 100),
                vacancy("b", "Kazan", 300),
                vacancy("c", "Moscow", 200),
            ],
        )
        .await;

        let kept = store
            .delete(&Criteria::new().with("city", "Moscow"))
            .await
            .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title(), "b");
        assert_eq!(store.query(&Criteria::new()).await.unwrap(), kept);
    }

    #[tokio::test]
    async fn delete_with_no_criteria_clears_store() {
        let dir = tempdir().unwrap();
        let store = store_with(
            dir.path(),
            &[vacancy("a", "Moscow", 100), vacancy("b", "Kazan", 300)],
        )
        .await;

        assert!(store.delete(&Criteria::new()).await.unwrap().is_empty());
        assert!(store.query(&Criteria::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn initialize_below_a_regular_file_is_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = VacancyStore::initialize(blocker.join("sub").join("v.json")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn writes_leave_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let store = store_with(dir.path(), &[vacancy("a", "Moscow", 100)]).await;
        store.delete(&Criteria::new().with("city", "Kazan")).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["vacancies.json"]);
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_contents() {
        let dir = tempdir().unwrap();
        let store = store_with(dir.path(), &[vacancy("a", "Moscow", 100)]).await;
        let before = std::fs::read_to_string(store.path()).unwrap();
        std::fs::create_dir(dir.path().join("vacancies.json.tmp")).unwrap();

        let err = store.add(&vacancy("b", "Kazan", 200)).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(store.query(&Criteria::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vacancies.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = VacancyStore::initialize(&path).await.unwrap();

        assert!(matches!(
            store.query(&Criteria::new()).await,
            Err(Error::Json(_))
        ));
        assert!(store.add(&vacancy("a", "Moscow", 1)).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn concurrent_adds_are_not_lost() {
        let dir = tempdir().unwrap();
        let store = store_with(dir.path(), &[]).await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .add(&vacancy(&format!("v{i}"), "Moscow", i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.query(&Criteria::new()).await.unwrap().len(), 16);
    }
}
