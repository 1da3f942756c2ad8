/// Keep the items no other item dominates on `(roi_ratio, closures)`.
///
/// `q` dominates `p` when it is at least as good on both axes and strictly
/// better on one. Identical points do not dominate each other, so duplicates
/// survive together. Survivors keep their input order.
pub fn pareto_front<T, F>(items: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (f64, u64),
{
    let keys: Vec<(f64, u64)> = items.iter().map(&key).collect();

    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            let (roi, closures) = keys[*i];
            !keys.iter().any(|&(other_roi, other_closures)| {
                other_roi >= roi
                    && other_closures >= closures
                    && (other_roi > roi || other_closures > closures)
            })
        })
        .map(|(_, item)| item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_dominated_pair_kept() {
        let a = ("A", 2.0, 100);
        let b = ("B", 1.5, 150);
        let c = ("C", 1.0, 90);

        let front = pareto_front(vec![a, b, c], |p| (p.1, p.2));
        let names: Vec<&str> = front.iter().map(|p| p.0).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_no_survivor_is_dominated() {
        let points: Vec<(f64, u64)> = (0..20)
            .map(|i| (((i * 7) % 11) as f64 / 3.0, ((i * 5) % 13) as u64))
            .collect();
        let front = pareto_front(points, |p| *p);

        for p in &front {
            for q in &front {
                let dominates = q.0 >= p.0 && q.1 >= p.1 && (q.0 > p.0 || q.1 > p.1);
                assert!(!dominates, "{:?} dominated by {:?}", p, q);
            }
        }
    }

    #[test]
    fn test_duplicates_survive() {
        let front = pareto_front(vec![(1.0, 5), (1.0, 5)], |p| *p);
        assert_eq!(front.len(), 2);
    }
}
